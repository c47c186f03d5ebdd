use super::validation::validate_config;
use super::*;
use crate::common::constants::test_constants::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn config_with_coordinates(latitude: f64, longitude: f64) -> Config {
    Config {
        location: Some(LocationMode::Manual),
        latitude: Some(latitude),
        longitude: Some(longitude),
        method: Some(TEST_METHOD),
        ..Config::default()
    }
}

fn write_config(dir: &std::path::Path, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join("miqat.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("miqat").join("miqat.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.location_mode(), LocationMode::Manual);
    assert_eq!(config.coordinates(), None);
    assert_eq!(config.method(), DEFAULT_METHOD);
}

#[test]
fn test_default_config_file_parses_and_validates() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("miqat.toml");

    create_default_config(&config_path).unwrap();
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("#[Location]"));
    assert!(content.contains("# latitude = 21.422500"));
    assert!(content.contains("method = 4"));

    let config = Config::load_from_path(&config_path).unwrap();
    assert_eq!(config.events(), DEFAULT_EVENTS.map(String::from).to_vec());
    assert_eq!(config.provider_url(), DEFAULT_PROVIDER_URL);
    assert_eq!(config.time_format, Some("24h".to_string()));
}

#[test]
fn test_default_config_comments_are_aligned() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("miqat.toml");
    create_default_config(&config_path).unwrap();

    let content = fs::read_to_string(&config_path).unwrap();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| line.contains(" = "))
        .map(|line| line.find(" # ").unwrap())
        .collect();
    assert!(columns.windows(2).all(|w| w[0] == w[1]), "{columns:?}");
}

#[test]
fn test_config_toml_parsing() {
    let content = r#"
location = "auto"
method = 2
events = ["Fajr", "Maghrib"]
reverse_geocode = false
time_format = "12h"
"#;
    let config: Config = toml::from_str(content).unwrap();

    assert_eq!(config.location_mode(), LocationMode::Auto);
    assert_eq!(config.method(), 2);
    assert_eq!(config.events(), vec!["Fajr", "Maghrib"]);
    assert!(!config.reverse_geocode());
    assert_eq!(config.time_format(), TimeFormat::TwelveHour);
}

#[test]
fn test_config_malformed_toml() {
    assert!(toml::from_str::<Config>("method = \"four\"").is_err());
    assert!(toml::from_str::<Config>("location = \"gps\"").is_err());
    assert!(toml::from_str::<Config>("sunset = \"19:00:00\"").is_err());
}

#[test]
fn test_accessor_defaults_on_empty_config() {
    let config = Config::default();
    assert_eq!(config.location_mode(), LocationMode::Manual);
    assert_eq!(config.method(), DEFAULT_METHOD);
    assert_eq!(config.events().len(), 6);
    assert!(config.reverse_geocode());
    assert_eq!(config.time_format(), TimeFormat::TwentyFourHour);
}

#[test]
fn test_coordinates_require_both_values() {
    let config = config_with_coordinates(TEST_LATITUDE, TEST_LONGITUDE);
    assert_eq!(
        config.coordinates(),
        Some(GeoPoint::new(TEST_LATITUDE, TEST_LONGITUDE).unwrap())
    );

    let half = Config {
        latitude: Some(TEST_LATITUDE),
        ..Config::default()
    };
    assert_eq!(half.coordinates(), None);
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&Config::default()).is_ok());
    assert!(validate_config(&config_with_coordinates(TEST_LATITUDE, TEST_LONGITUDE)).is_ok());
}

#[test]
fn test_config_validation_coordinate_ranges() {
    assert!(validate_config(&config_with_coordinates(90.0, 180.0)).is_ok());
    assert!(validate_config(&config_with_coordinates(-90.0, -180.0)).is_ok());

    let err = validate_config(&config_with_coordinates(91.0, 0.0)).unwrap_err();
    assert!(err.to_string().contains("latitude"));
    let err = validate_config(&config_with_coordinates(0.0, 180.5)).unwrap_err();
    assert!(err.to_string().contains("longitude"));
}

#[test]
fn test_config_validation_method_range() {
    let ok = Config {
        method: Some(MAXIMUM_METHOD),
        ..Config::default()
    };
    assert!(validate_config(&ok).is_ok());

    let bad = Config {
        method: Some(MAXIMUM_METHOD + 1),
        ..Config::default()
    };
    assert!(validate_config(&bad).unwrap_err().to_string().contains("method"));
}

#[test]
fn test_config_validation_events() {
    let events = |list: &[&str]| Config {
        events: Some(list.iter().map(|s| s.to_string()).collect()),
        ..Config::default()
    };

    assert!(validate_config(&events(&["Fajr"])).is_ok());
    assert!(validate_config(&events(&[])).is_err());
    assert!(validate_config(&events(&["Fajr", " "])).is_err());

    let err = validate_config(&events(&["Fajr", "Asr", "Fajr"])).unwrap_err();
    assert_eq!(err.to_string(), "events lists \"Fajr\" more than once");
}

#[test]
fn test_config_validation_provider_and_format() {
    let empty_url = Config {
        provider_url: Some("  ".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&empty_url).is_err());

    let bad_format = Config {
        time_format: Some("ampm".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&bad_format).is_err());
}

#[test]
fn test_load_from_path_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(temp_dir.path(), "latitude = 123.0\nlongitude = 0.0\n");

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("latitude"));
}

#[test]
fn test_load_from_missing_path_is_error() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nowhere.toml");
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_geo_toml_loading() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("miqat");
    let config_path = write_config(&config_dir, "method = 4\n");
    fs::write(
        config_dir.join("geo.toml"),
        "# Private geo coordinates\nlatitude = 51.5074\nlongitude = -0.1278\n",
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.latitude, Some(51.5074));
    assert_eq!(config.longitude, Some(-0.1278));
}

#[test]
fn test_geo_toml_overrides_main_config() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("miqat");
    let config_path = write_config(&config_dir, "latitude = 40.7128\nlongitude = -74.0060\n");
    fs::write(config_dir.join("geo.toml"), "latitude = 51.5074\n").unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.latitude, Some(51.5074));
    assert_eq!(config.longitude, Some(-74.0060));
}

#[test]
fn test_malformed_geo_toml_fallback() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("miqat");
    let config_path = write_config(&config_dir, "latitude = 40.7128\nlongitude = -74.0060\n");
    fs::write(config_dir.join("geo.toml"), "latitude = [oops").unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.latitude, Some(40.7128));
}

#[test]
fn test_geo_toml_values_are_validated() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("miqat");
    let config_path = write_config(&config_dir, "method = 4\n");
    fs::write(config_dir.join("geo.toml"), "latitude = -95.0\nlongitude = 0.0\n").unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_in_range_coordinates_always_validate(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            method in MINIMUM_METHOD..=MAXIMUM_METHOD,
        ) {
            let config = Config {
                method: Some(method),
                ..config_with_coordinates(lat, lon)
            };
            prop_assert!(validate_config(&config).is_ok());
            prop_assert!(config.coordinates().is_some());
        }

        #[test]
        fn test_out_of_range_latitude_always_rejected(
            lat in prop_oneof![-1000.0f64..-90.001, 90.001f64..1000.0],
        ) {
            prop_assert!(validate_config(&config_with_coordinates(lat, 0.0)).is_err());
        }
    }
}
