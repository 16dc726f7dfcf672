use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use engine::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const SETTINGS_ENV_VAR: &str = "PUZZLE_ROOM_SETTINGS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LocomotionSettings {
    pub(crate) player_speed: f32,
    pub(crate) jump_height: f32,
    pub(crate) gravity: f32,
    pub(crate) rotation_speed: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            player_speed: 2.0,
            jump_height: 1.0,
            gravity: -9.81,
            rotation_speed: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PuzzleSettings {
    pub(crate) main_camera_priority: i32,
    pub(crate) active_camera_priority: i32,
    pub(crate) dormant_camera_priority: i32,
    pub(crate) door_offset: Vec3,
    pub(crate) prompt: String,
    pub(crate) interaction_radius: f32,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            main_camera_priority: 10,
            active_camera_priority: 100,
            dormant_camera_priority: 0,
            door_offset: Vec3::new(0.0, 4.0, 0.0),
            prompt: "Press E to tilt the maze".to_string(),
            interaction_radius: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MazeSettings {
    pub(crate) max_tilt_degrees: f32,
    pub(crate) tilt_speed_degrees_per_second: f32,
    pub(crate) gravity_magnitude: f32,
    pub(crate) rolling_damping: f32,
}

impl Default for MazeSettings {
    fn default() -> Self {
        Self {
            max_tilt_degrees: 15.0,
            tilt_speed_degrees_per_second: 60.0,
            gravity_magnitude: 9.81,
            rolling_damping: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CameraSettings {
    pub(crate) follow_distance: f32,
    pub(crate) follow_height: f32,
    pub(crate) pitch_degrees: f32,
    pub(crate) orbit_speed_degrees_per_second: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            follow_distance: 5.0,
            follow_height: 3.0,
            pitch_degrees: 20.0,
            orbit_speed_degrees_per_second: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationSettings {
    pub(crate) target_tps: u32,
    pub(crate) max_headless_ticks: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_headless_ticks: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RoomSettings {
    pub(crate) locomotion: LocomotionSettings,
    pub(crate) puzzle: PuzzleSettings,
    pub(crate) maze: MazeSettings,
    pub(crate) camera: CameraSettings,
    pub(crate) simulation: SimulationSettings,
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Loads settings from the file named by `PUZZLE_ROOM_SETTINGS`, or the
/// built-in defaults when the variable is unset.
pub(crate) fn load_settings() -> Result<RoomSettings, SettingsError> {
    match env::var(SETTINGS_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => load_settings_from_path(Path::new(value.trim())),
        Ok(_) | Err(env::VarError::NotPresent) => {
            info!(env_var = SETTINGS_ENV_VAR, "settings_defaults");
            Ok(RoomSettings::default())
        }
        Err(err) => {
            warn!(
                env_var = SETTINGS_ENV_VAR,
                error = %err,
                "unable to read settings env var; falling back to defaults"
            );
            Ok(RoomSettings::default())
        }
    }
}

pub(crate) fn load_settings_from_path(path: &Path) -> Result<RoomSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(&raw, path)?;
    info!(path = %path.display(), "settings_loaded");
    Ok(settings)
}

fn parse_settings(raw: &str, origin: &Path) -> Result<RoomSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let settings: RoomSettings = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            SettingsError::Parse {
                path: origin.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        },
    )?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn invalid(field: &'static str, message: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        field,
        message: message.into(),
    }
}

fn require_finite(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

pub(crate) fn validate_settings(settings: &RoomSettings) -> Result<(), SettingsError> {
    let locomotion = &settings.locomotion;
    require_finite("locomotion.player_speed", locomotion.player_speed)?;
    if locomotion.player_speed <= 0.0 {
        return Err(invalid("locomotion.player_speed", "must be positive"));
    }
    require_finite("locomotion.jump_height", locomotion.jump_height)?;
    if locomotion.jump_height < 0.0 {
        return Err(invalid("locomotion.jump_height", "must not be negative"));
    }
    require_finite("locomotion.gravity", locomotion.gravity)?;
    if locomotion.gravity >= 0.0 {
        return Err(invalid(
            "locomotion.gravity",
            "must be negative (points down the Y axis)",
        ));
    }
    require_finite("locomotion.rotation_speed", locomotion.rotation_speed)?;
    if locomotion.rotation_speed < 0.0 {
        return Err(invalid("locomotion.rotation_speed", "must not be negative"));
    }

    let puzzle = &settings.puzzle;
    if puzzle.active_camera_priority <= puzzle.main_camera_priority {
        return Err(invalid(
            "puzzle.active_camera_priority",
            "must be above puzzle.main_camera_priority",
        ));
    }
    if puzzle.dormant_camera_priority >= puzzle.main_camera_priority {
        return Err(invalid(
            "puzzle.dormant_camera_priority",
            "must be below puzzle.main_camera_priority",
        ));
    }
    if !puzzle.door_offset.is_finite() {
        return Err(invalid("puzzle.door_offset", "must be finite"));
    }
    require_finite("puzzle.interaction_radius", puzzle.interaction_radius)?;
    if puzzle.interaction_radius <= 0.0 {
        return Err(invalid("puzzle.interaction_radius", "must be positive"));
    }

    let maze = &settings.maze;
    require_finite("maze.max_tilt_degrees", maze.max_tilt_degrees)?;
    if maze.max_tilt_degrees <= 0.0 || maze.max_tilt_degrees >= 90.0 {
        return Err(invalid(
            "maze.max_tilt_degrees",
            "must be between 0 and 90 exclusive",
        ));
    }
    require_finite(
        "maze.tilt_speed_degrees_per_second",
        maze.tilt_speed_degrees_per_second,
    )?;
    if maze.tilt_speed_degrees_per_second <= 0.0 {
        return Err(invalid(
            "maze.tilt_speed_degrees_per_second",
            "must be positive",
        ));
    }
    require_finite("maze.gravity_magnitude", maze.gravity_magnitude)?;
    require_finite("maze.rolling_damping", maze.rolling_damping)?;
    if maze.rolling_damping < 0.0 {
        return Err(invalid("maze.rolling_damping", "must not be negative"));
    }

    let camera = &settings.camera;
    require_finite("camera.follow_distance", camera.follow_distance)?;
    require_finite("camera.follow_height", camera.follow_height)?;
    require_finite("camera.pitch_degrees", camera.pitch_degrees)?;
    require_finite(
        "camera.orbit_speed_degrees_per_second",
        camera.orbit_speed_degrees_per_second,
    )?;

    if settings.simulation.target_tps == 0 {
        return Err(invalid("simulation.target_tps", "must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(raw: &str) -> Result<RoomSettings, SettingsError> {
        parse_settings(raw, Path::new("test.json"))
    }

    #[test]
    fn defaults_match_the_reference_tuning() {
        let settings = RoomSettings::default();
        assert_eq!(settings.locomotion.player_speed, 2.0);
        assert_eq!(settings.locomotion.jump_height, 1.0);
        assert_eq!(settings.locomotion.gravity, -9.81);
        assert_eq!(settings.locomotion.rotation_speed, 4.0);
        assert_eq!(settings.puzzle.active_camera_priority, 100);
        assert_eq!(settings.puzzle.dormant_camera_priority, 0);
        assert_eq!(settings.puzzle.door_offset, Vec3::new(0.0, 4.0, 0.0));
        validate_settings(&settings).expect("defaults are valid");
    }

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(parse("{}").expect("parse"), RoomSettings::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings = parse(r#"{ "locomotion": { "player_speed": 3.5 } }"#).expect("parse");
        assert_eq!(settings.locomotion.player_speed, 3.5);
        assert_eq!(settings.locomotion.gravity, -9.81);
    }

    #[test]
    fn unknown_field_reports_json_path() {
        let error = parse(r#"{ "puzzle": { "door_ofset": { "x": 0, "y": 4, "z": 0 } } }"#)
            .expect_err("unknown field");
        match error {
            SettingsError::Parse { json_path, .. } => assert_eq!(json_path, "puzzle.door_ofset"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_type_reports_nested_path() {
        let error = parse(r#"{ "locomotion": { "jump_height": "high" } }"#).expect_err("type");
        assert!(error.to_string().contains("locomotion.jump_height"));
    }

    #[test]
    fn non_negative_gravity_is_rejected() {
        let error = parse(r#"{ "locomotion": { "gravity": 9.81 } }"#).expect_err("gravity");
        match error {
            SettingsError::Invalid { field, .. } => assert_eq!(field, "locomotion.gravity"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_positive_tilt_speed_is_rejected() {
        for raw in [
            r#"{ "maze": { "tilt_speed_degrees_per_second": -60.0 } }"#,
            r#"{ "maze": { "tilt_speed_degrees_per_second": 0.0 } }"#,
        ] {
            match parse(raw).expect_err("tilt speed") {
                SettingsError::Invalid { field, .. } => {
                    assert_eq!(field, "maze.tilt_speed_degrees_per_second")
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn puzzle_camera_must_outrank_main_camera() {
        let error = parse(r#"{ "puzzle": { "active_camera_priority": 5 } }"#)
            .expect_err("priority ordering");
        assert!(error.to_string().contains("puzzle.active_camera_priority"));
    }

    #[test]
    fn settings_file_round_trips_through_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "maze": {{ "max_tilt_degrees": 20.0 }}, "simulation": {{ "target_tps": 30 }} }}"#
        )
        .expect("write");

        let settings = load_settings_from_path(file.path()).expect("load");
        assert_eq!(settings.maze.max_tilt_degrees, 20.0);
        assert_eq!(settings.simulation.target_tps, 30);
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/puzzle_room.json");
        assert_eq!(
            load_settings_from_path(&path).expect("sample loads"),
            RoomSettings::default()
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = load_settings_from_path(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(error, SettingsError::Read { .. }));
    }
}
