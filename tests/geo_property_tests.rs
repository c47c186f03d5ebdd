use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use miqat::common::constants::EARTH_RADIUS_KM;
use miqat::geo::{
    GeoPoint, KAABA, cardinal_direction, compute_bearing, great_circle_distance_km, qibla_bearing,
    qibla_distance_km,
};
use miqat::schedule::{DailyEvent, DailySchedule, compute_remaining, find_next_event};
use proptest::prelude::*;

/// Latitudes away from the poles, where bearings are well defined
fn latitude_strategy() -> impl Strategy<Value = f64> {
    -89.0..=89.0
}

fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

fn point_strategy() -> impl Strategy<Value = GeoPoint> {
    (latitude_strategy(), longitude_strategy())
        .prop_map(|(lat, lon)| GeoPoint::new(lat, lon).unwrap())
}

#[cfg(test)]
mod geodesy_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_bearing_in_range(a in point_strategy(), b in point_strategy()) {
            let bearing = compute_bearing(a, b);
            prop_assert!((0.0..360.0).contains(&bearing), "bearing was {bearing}");
            prop_assert!(!cardinal_direction(bearing).is_empty());
        }

        #[test]
        fn test_qibla_bearing_in_range(origin in point_strategy()) {
            let bearing = qibla_bearing(origin);
            prop_assert!((0.0..360.0).contains(&bearing));
        }

        #[test]
        fn test_distance_symmetric_and_bounded(a in point_strategy(), b in point_strategy()) {
            let ab = great_circle_distance_km(a, b);
            let ba = great_circle_distance_km(b, a);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-6, "{ab} vs {ba}");
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn test_qibla_distance_matches_great_circle(origin in point_strategy()) {
            let direct = great_circle_distance_km(origin, KAABA);
            prop_assert!((qibla_distance_km(origin) - direct).abs() < 1e-6);
        }

        #[test]
        fn test_triangle_inequality(
            a in point_strategy(),
            b in point_strategy(),
            c in point_strategy()
        ) {
            let ac = great_circle_distance_km(a, c);
            let via_b = great_circle_distance_km(a, b) + great_circle_distance_km(b, c);
            prop_assert!(ac <= via_b + 1e-6);
        }
    }
}

#[cfg(test)]
mod next_event_properties {
    use super::*;

    /// 1 to 6 distinct minutes of the day, ascending
    fn schedule_strategy() -> impl Strategy<Value = DailySchedule> {
        prop::collection::btree_set(0u32..1440, 1..=6).prop_map(|minutes| {
            let events = minutes
                .into_iter()
                .enumerate()
                .map(|(i, m)| DailyEvent::new(format!("event{i}"), m / 60, m % 60).unwrap())
                .collect();
            DailySchedule::new(events).unwrap()
        })
    }

    /// An instant on a fixed date in UTC+03:00, millisecond resolution
    fn now_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
        (0i64..86_400_000).prop_map(|ms| {
            let tz = FixedOffset::east_opt(3 * 3600).unwrap();
            let midnight = NaiveDate::from_ymd_opt(2026, 10, 17)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            tz.from_local_datetime(&midnight).unwrap() + Duration::milliseconds(ms)
        })
    }

    proptest! {
        #[test]
        fn test_target_strictly_after_now_and_within_a_day(
            schedule in schedule_strategy(),
            now in now_strategy()
        ) {
            let next = find_next_event(&schedule, &now);
            prop_assert!(next.target > now);
            prop_assert!(next.target - now <= Duration::hours(24));
            prop_assert!(next.index < schedule.len());

            let remaining = compute_remaining(&next.target, &now);
            prop_assert!(remaining.total_millis() > 0);
            prop_assert!(remaining.hours() <= 24);
        }

        #[test]
        fn test_no_event_skipped(
            schedule in schedule_strategy(),
            now in now_strategy()
        ) {
            let next = find_next_event(&schedule, &now);
            let today = now.date_naive();

            for event in schedule.iter() {
                let at = now
                    .timezone()
                    .from_local_datetime(&today.and_time(event.time()))
                    .unwrap();
                if at > now {
                    prop_assert!(!next.rolled_over);
                    prop_assert!(next.target <= at);
                }
            }

            if next.rolled_over {
                prop_assert_eq!(next.index, 0);
                prop_assert_eq!(next.target.date_naive(), today.succ_opt().unwrap());
            } else {
                prop_assert_eq!(next.target.date_naive(), today);
            }
        }

        #[test]
        fn test_selection_is_stable_between_events(
            schedule in schedule_strategy(),
            now in now_strategy(),
            step_ms in 1i64..60_000
        ) {
            let first = find_next_event(&schedule, &now);
            let later = now + Duration::milliseconds(step_ms);
            if later < first.target {
                let second = find_next_event(&schedule, &later);
                prop_assert_eq!(second.index, first.index);
                prop_assert_eq!(second.target, first.target);
            }
        }
    }
}
