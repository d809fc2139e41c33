use crate::models::BoundingBox;

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance in kilometers between two `(lat, lon)` points in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional coordinate pairs; `None` unless both are known
#[inline]
pub fn distance_between(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<f64> {
    match (a, b) {
        (Some((lat1, lon1)), Some((lat2, lon2))) => Some(haversine_distance(lat1, lon1, lat2, lon2)),
        _ => None,
    }
}

/// Cheap rectangular pre-filter around a center point
///
/// Used to narrow the nearby query in SQL before the exact haversine check.
/// Near the poles the longitude span degenerates, so it is widened to the full range.
/// A span that runs past ±180 wraps around and yields `min_lon > max_lon`.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;

    let cos_lat = lat.to_radians().cos().abs();
    let lon_delta = if cos_lat < 1e-6 {
        180.0
    } else {
        (radius_km / (KM_PER_DEGREE * cos_lat)).min(180.0)
    };

    let (min_lon, max_lon) = if lon_delta >= 180.0 {
        (-180.0, 180.0)
    } else {
        (wrap_longitude(lon - lon_delta), wrap_longitude(lon + lon_delta))
    };

    BoundingBox {
        min_lat: (lat - lat_delta).max(-90.0),
        max_lat: (lat + lat_delta).min(90.0),
        min_lon,
        max_lon,
    }
}

/// Bring a longitude back into `[-180, 180]`
#[inline]
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    bbox.contains(lat, lon)
}

/// Keep the points within `radius_km` of the center, attach their distance and sort nearest first
pub fn within_radius<T>(
    center: (f64, f64),
    radius_km: f64,
    items: Vec<T>,
    coords: impl Fn(&T) -> Option<(f64, f64)>,
) -> Vec<(T, f64)> {
    let bbox = calculate_bounding_box(center.0, center.1, radius_km);

    let mut nearby: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| {
            let (lat, lon) = coords(&item)?;
            if !is_within_bounding_box(lat, lon, &bbox) {
                return None;
            }
            let distance = haversine_distance(center.0, center.1, lat, lon);
            (distance <= radius_km).then_some((item, distance))
        })
        .collect();

    nearby.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_london_paris() {
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_distance_between_requires_both_points() {
        assert!(distance_between(Some((1.0, 1.0)), None).is_none());
        assert!(distance_between(None, Some((1.0, 1.0))).is_none());
        let d = distance_between(Some((0.0, 0.0)), Some((0.0, 0.0))).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_span() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
        assert!(is_within_bounding_box(40.71, -74.0, &bbox));
        assert!(!is_within_bounding_box(50.0, -80.0, &bbox));
    }

    #[test]
    fn test_bounding_box_at_pole_is_clamped() {
        let bbox = calculate_bounding_box(90.0, 0.0, 50.0);
        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
    }

    #[test]
    fn test_bounding_box_wraps_at_antimeridian() {
        let bbox = calculate_bounding_box(-17.0, 179.9, 50.0);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.min_lon > 179.0 && bbox.max_lon < -179.0);
        assert!(is_within_bounding_box(-17.0, -179.9, &bbox));
        assert!(is_within_bounding_box(-17.0, 179.95, &bbox));
        assert!(!is_within_bounding_box(-17.0, 0.0, &bbox));
    }

    #[test]
    fn test_within_radius_across_antimeridian() {
        let points = vec![("fiji-east", Some((-17.0, -179.9))), ("far", Some((-17.0, 170.0)))];
        let nearby = within_radius((-17.0, 179.9), 50.0, points, |p| p.1);
        assert_eq!(nearby.len(), 1);
        assert_eq!((nearby[0].0).0, "fiji-east");
        assert!(nearby[0].1 < 25.0);
    }

    #[test]
    fn test_within_radius_sorts_and_filters() {
        let london = (51.5074, -0.1278);
        let points = vec![
            ("paris", Some((48.8566, 2.3522))),
            ("unknown", None),
            ("brighton", Some((50.8225, -0.1372))),
            ("new york", Some((40.7128, -74.0060))),
        ];

        let nearby = within_radius(london, 400.0, points, |p| p.1);
        let names: Vec<&str> = nearby.iter().map(|(p, _)| p.0).collect();
        assert_eq!(names, vec!["brighton", "paris"]);
        assert!(nearby[0].1 < nearby[1].1);
    }
}
