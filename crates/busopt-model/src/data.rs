/// A bus (or other vehicle) with a trip capacity and an operating cost per
/// distance unit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FleetUnit {
    pub name: String,
    /// Maximum number of trips this unit can serve
    pub capacity: f64,
    pub cost_per_km: f64,
}

/// A travel line with a required number of trips and a length.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    /// Trips that must be served, exactly
    pub demand: f64,
    pub distance: f64,
}

/// The two clean input tables for one solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub fleet: Vec<FleetUnit>,
    pub routes: Vec<Route>,
}

impl FleetUnit {
    pub fn new(name: impl Into<String>, capacity: f64, cost_per_km: f64) -> Self {
        Self {
            name: name.into(),
            capacity,
            cost_per_km,
        }
    }
}

impl Route {
    pub fn new(name: impl Into<String>, demand: f64, distance: f64) -> Self {
        Self {
            name: name.into(),
            demand,
            distance,
        }
    }
}

impl Dataset {
    pub fn new(fleet: Vec<FleetUnit>, routes: Vec<Route>) -> Self {
        Self { fleet, routes }
    }

    pub fn total_capacity(&self) -> f64 {
        self.fleet.iter().map(|u| u.capacity).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.routes.iter().map(|r| r.demand).sum()
    }

    /// Whether the fleet as a whole can cover every route.
    ///
    /// Every unit may serve every route, so this is also the exact
    /// feasibility condition of the transport model.
    pub fn capacity_covers_demand(&self, tolerance: f64) -> bool {
        self.total_capacity() + tolerance >= self.total_demand()
    }

    /// First value that is negative or not finite, described for an error
    /// message, or `None` when every number in the dataset is usable.
    pub fn invalid_value(&self) -> Option<String> {
        let fleet = self.fleet.iter().flat_map(|u| {
            [
                (&u.name, "capacity", u.capacity),
                (&u.name, "cost_per_km", u.cost_per_km),
            ]
        });
        let routes = self.routes.iter().flat_map(|r| {
            [
                (&r.name, "demand", r.demand),
                (&r.name, "distance", r.distance),
            ]
        });

        fleet
            .chain(routes)
            .find(|(_, _, value)| !value.is_finite() || *value < 0.0)
            .map(|(name, column, value)| format!("{} of {} is {}", column, name, value))
    }

    /// Cost of one trip of `unit` on `route`.
    pub fn trip_cost(&self, unit: usize, route: usize) -> f64 {
        self.fleet[unit].cost_per_km * self.routes[route].distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let dataset = Dataset::new(
            vec![FleetUnit::new("BusA", 3.0, 1.0), FleetUnit::new("BusB", 10.0, 5.0)],
            vec![Route::new("Route1", 5.0, 1.0), Route::new("Route2", 4.0, 2.5)],
        );

        assert_eq!(dataset.total_capacity(), 13.0);
        assert_eq!(dataset.total_demand(), 9.0);
        assert!(dataset.capacity_covers_demand(1e-6));
        assert_eq!(dataset.trip_cost(1, 1), 12.5);
    }

    #[test]
    fn test_invalid_value() {
        let mut dataset = Dataset::new(
            vec![FleetUnit::new("BusA", 2.0, 1.0)],
            vec![Route::new("Route1", 5.0, 1.0)],
        );
        assert_eq!(dataset.invalid_value(), None);

        dataset.routes[0].demand = -3.0;
        assert_eq!(dataset.invalid_value().unwrap(), "demand of Route1 is -3");

        dataset.routes[0].demand = 3.0;
        dataset.fleet[0].capacity = f64::INFINITY;
        assert_eq!(dataset.invalid_value().unwrap(), "capacity of BusA is inf");
    }

    #[test]
    fn test_capacity_shortfall() {
        let dataset = Dataset::new(
            vec![FleetUnit::new("BusA", 2.0, 1.0)],
            vec![Route::new("Route1", 5.0, 1.0)],
        );

        assert!(!dataset.capacity_covers_demand(1e-6));
    }
}
