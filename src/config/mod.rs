//! Layer configuration for the random shear augmentation.
//!
//! A [`RandomShearConfig`] holds every constructor parameter of the layer in
//! the exact form the user supplied it, so that exporting a layer's config
//! and building a new layer from it reproduces the original parameters.
//! Enum-valued parameters (`interpolation`, `fill_mode`, `data_format`) are
//! parsed from their string names at deserialization time, which means an
//! unknown name fails while the config is being loaded, long before the
//! first image is transformed.
//!
//! Config files are JSON, or YAML when the path ends in `.yaml`/`.yml`.

mod range;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::RandShearError;

pub use range::{FactorSpec, ShearRange, FACTOR_BOUNDS};

/// Resampling rule used when reading source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
        }
    }
}

impl FromStr for Interpolation {
    type Err = RandShearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" => Ok(Interpolation::Bilinear),
            other => Err(RandShearError::UnknownInterpolation(other.to_string())),
        }
    }
}

impl TryFrom<String> for Interpolation {
    type Error = RandShearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How source coordinates outside the image are resolved.
///
/// - `Reflect`: `(d c b a | a b c d | d c b a)`
/// - `Constant`: `(k k k k | a b c d | k k k k)` with `k = fill_value`
/// - `Wrap`: `(a b c d | a b c d | a b c d)`
/// - `Nearest`: `(a a a a | a b c d | d d d d)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FillMode {
    #[default]
    Reflect,
    Wrap,
    Constant,
    Nearest,
}

impl FillMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillMode::Reflect => "reflect",
            FillMode::Wrap => "wrap",
            FillMode::Constant => "constant",
            FillMode::Nearest => "nearest",
        }
    }
}

impl FromStr for FillMode {
    type Err = RandShearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reflect" => Ok(FillMode::Reflect),
            "wrap" => Ok(FillMode::Wrap),
            "constant" => Ok(FillMode::Constant),
            "nearest" => Ok(FillMode::Nearest),
            other => Err(RandShearError::UnknownFillMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for FillMode {
    type Error = RandShearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Axis layout of image tensors.
///
/// Batched `ChannelsLast` tensors are `[batch, height, width, channels]`,
/// batched `ChannelsFirst` tensors are `[batch, channels, height, width]`.
/// Unbatched tensors drop the leading axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DataFormat {
    #[default]
    ChannelsLast,
    ChannelsFirst,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::ChannelsLast => "channels_last",
            DataFormat::ChannelsFirst => "channels_first",
        }
    }
}

impl FromStr for DataFormat {
    type Err = RandShearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channels_last" => Ok(DataFormat::ChannelsLast),
            "channels_first" => Ok(DataFormat::ChannelsFirst),
            other => Err(RandShearError::UnknownDataFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for DataFormat {
    type Error = RandShearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Interpolation, FillMode, DataFormat);

/// Constructor parameters of the random shear layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomShearConfig {
    /// Layer name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Horizontal shear factor.
    #[serde(deserialize_with = "range::deserialize_x_factor")]
    pub x_factor: FactorSpec,
    /// Vertical shear factor.
    #[serde(deserialize_with = "range::deserialize_y_factor")]
    pub y_factor: FactorSpec,
    pub interpolation: Interpolation,
    pub fill_mode: FillMode,
    /// Fill value used when `fill_mode` is `constant`.
    pub fill_value: f32,
    pub data_format: DataFormat,
    /// Seed for the layer's random generator. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RandomShearConfig {
    fn default() -> Self {
        Self {
            name: None,
            x_factor: FactorSpec::Scalar(0.0),
            y_factor: FactorSpec::Scalar(0.0),
            interpolation: Interpolation::default(),
            fill_mode: FillMode::default(),
            fill_value: 0.0,
            data_format: DataFormat::default(),
            seed: None,
        }
    }
}

impl RandomShearConfig {
    /// Creates a config with the given factors and defaults for the rest.
    pub fn new(x_factor: impl Into<FactorSpec>, y_factor: impl Into<FactorSpec>) -> Self {
        Self {
            x_factor: x_factor.into(),
            y_factor: y_factor.into(),
            ..Default::default()
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn with_fill_value(mut self, fill_value: f32) -> Self {
        self.fill_value = fill_value;
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validates both factors and returns their sampling ranges `(x, y)`.
    pub fn factor_ranges(&self) -> Result<(ShearRange, ShearRange), RandShearError> {
        let x = ShearRange::from_spec(&self.x_factor, "x_factor")?;
        let y = ShearRange::from_spec(&self.y_factor, "y_factor")?;
        Ok((x, y))
    }
}

/// Reads a layer config from a JSON or YAML file.
///
/// The format is chosen from the file extension: `.yaml` and `.yml` are
/// parsed as YAML, everything else as JSON. Factor values are not
/// range-checked here; that happens when a layer is built from the config.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_config_file(path: &Path) -> Result<RandomShearConfig, RandShearError> {
    let file = File::open(path).map_err(RandShearError::Io)?;
    let reader = BufReader::new(file);

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let parsed = if is_yaml {
        serde_yaml::from_reader(reader).map_err(|e| e.to_string())
    } else {
        serde_json::from_reader(reader).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| RandShearError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Writes a layer config to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_config_file(path: &Path, config: &RandomShearConfig) -> Result<(), RandShearError> {
    let file = File::create(path).map_err(RandShearError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, config).map_err(|source| {
        RandShearError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(RandShearError::Io)?;

    Ok(())
}

/// Reads a layer config from a JSON string.
pub fn from_json_str(json: &str) -> Result<RandomShearConfig, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes a layer config to a pretty-printed JSON string.
pub fn to_json_string(config: &RandomShearConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layer_defaults() {
        let config = RandomShearConfig::default();
        assert_eq!(config.x_factor, FactorSpec::Scalar(0.0));
        assert_eq!(config.y_factor, FactorSpec::Scalar(0.0));
        assert_eq!(config.interpolation, Interpolation::Bilinear);
        assert_eq!(config.fill_mode, FillMode::Reflect);
        assert_eq!(config.fill_value, 0.0);
        assert_eq!(config.data_format, DataFormat::ChannelsLast);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn empty_json_object_uses_defaults() {
        let config = from_json_str("{}").expect("parse empty config");
        assert_eq!(config, RandomShearConfig::default());
    }

    #[test]
    fn json_roundtrip_preserves_every_field() {
        let original = RandomShearConfig::new(0.2, (0.5, 0.1))
            .with_interpolation(Interpolation::Nearest)
            .with_fill_mode(FillMode::Constant)
            .with_fill_value(0.75)
            .with_data_format(DataFormat::ChannelsFirst)
            .with_seed(1337)
            .with_name("shear");

        let json = to_json_string(&original).expect("serialize config");
        let restored = from_json_str(&json).expect("parse config");
        assert_eq!(original, restored);
    }

    #[test]
    fn json_uses_lowercase_names() {
        let config = RandomShearConfig::default().with_data_format(DataFormat::ChannelsFirst);
        let json = to_json_string(&config).unwrap();
        assert!(json.contains("\"bilinear\""));
        assert!(json.contains("\"reflect\""));
        assert!(json.contains("\"channels_first\""));
    }

    #[test]
    fn unknown_fill_mode_fails_at_parse() {
        let err = from_json_str(r#"{"fill_mode": "mirror"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown `fill_mode` mirror"));
    }

    #[test]
    fn unknown_interpolation_fails_at_parse() {
        let err = from_json_str(r#"{"interpolation": "bicubic"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown `interpolation` bicubic"));
    }

    #[test]
    fn string_factor_fails_naming_the_field() {
        let err = from_json_str(r#"{"x_factor": "0.3"}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("The `x_factor` argument should be a number"), "{message}");
        assert!(message.contains(r#"x_factor="0.3""#), "{message}");
    }

    #[test]
    fn mixed_list_factor_fails_naming_the_field() {
        let err = from_json_str(r#"{"y_factor": [0.1, "a"]}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("The `y_factor` argument should be a number"), "{message}");
        assert!(message.contains("in the range [0, 1.0]"), "{message}");
    }

    #[test]
    fn map_or_bool_factor_is_rejected() {
        assert!(from_json_str(r#"{"x_factor": {"lower": 0.1}}"#)
            .unwrap_err()
            .to_string()
            .contains("`x_factor`"));
        assert!(from_json_str(r#"{"y_factor": true}"#)
            .unwrap_err()
            .to_string()
            .contains("`y_factor`"));
    }

    #[test]
    fn yaml_string_factor_fails_naming_the_field() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("shear.yml");
        std::fs::write(&path, "x_factor: \"0.3\"\n").unwrap();

        let err = read_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("The `x_factor` argument"), "{err}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(from_json_str(r#"{"rotation": 0.3}"#).is_err());
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!("wrap".parse::<FillMode>().unwrap(), FillMode::Wrap);
        assert_eq!(
            "nearest".parse::<Interpolation>().unwrap(),
            Interpolation::Nearest
        );
        assert_eq!(
            "channels_last".parse::<DataFormat>().unwrap(),
            DataFormat::ChannelsLast
        );
        assert!("NEAREST".parse::<Interpolation>().is_err());
    }

    #[test]
    fn factor_ranges_validate_both_axes() {
        let config = RandomShearConfig::new(0.1, 2.0);
        let err = config.factor_ranges().unwrap_err();
        assert!(err.to_string().contains("y_factor"));
    }

    #[test]
    fn yaml_file_is_detected_by_extension() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("shear.yaml");
        std::fs::write(
            &path,
            "x_factor: [0.1, 0.3]\ny_factor: 0.2\nfill_mode: wrap\nseed: 7\n",
        )
        .unwrap();

        let config = read_config_file(&path).expect("read yaml config");
        assert_eq!(config.x_factor, FactorSpec::Range(vec![0.1, 0.3]));
        assert_eq!(config.y_factor, FactorSpec::Scalar(0.2));
        assert_eq!(config.fill_mode, FillMode::Wrap);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("shear.json");
        let original = RandomShearConfig::new(0.4, 0.0).with_seed(3);

        write_config_file(&path, &original).expect("write config");
        let restored = read_config_file(&path).expect("read config");
        assert_eq!(original, restored);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_reports_failed_flush() {
        // /dev/full accepts the open but fails every write with ENOSPC.
        let config = RandomShearConfig::new(0.4, 0.0).with_seed(3);
        let err = write_config_file(Path::new("/dev/full"), &config).unwrap_err();
        assert!(matches!(err, RandShearError::Io(_)));
    }
}
