use crate::models::trip::Position;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers, using the
/// haversine formula on a spherical Earth. Out-of-range coordinates are not
/// special-cased; they simply flow through the formula.
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero() {
        let p = Position::new(48.8566, 2.3522);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let p = Position::new(52.5200, 13.4050);
        let q = Position::new(48.8566, 2.3522);
        assert!((haversine_km(p, q) - haversine_km(q, p)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km(Position::new(0.0, 0.0), Position::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn paris_city_hop() {
        let d = haversine_km(
            Position::new(48.8566, 2.3522),
            Position::new(48.8570, 2.3530),
        );
        assert!(d > 0.0 && d < 0.2, "got {d}");
    }
}
