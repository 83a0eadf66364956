use tessera::{
    Atlas, BiomeConfig, BiomeRule, ConfigError, GridPoint, MapConfig,
    NoiseConfig, TileMap,
};
use validator::ValidationErrors;

fn generate_err(config: MapConfig) -> anyhow::Error {
    TileMap::generate(config, &Atlas::default()).unwrap_err()
}

fn config_error(config: MapConfig) -> ConfigError {
    let err = generate_err(config);
    match err.downcast_ref::<ConfigError>() {
        Some(config_error) => config_error.clone(),
        None => panic!("expected a ConfigError, got {:?}", err),
    }
}

#[test]
fn test_config_validation() {
    let config = MapConfig {
        width: 0,     // invalid
        height: 5000, // invalid
        tile_size: 32,
        noise: NoiseConfig {
            octaves: 0,        // invalid
            lacunarity: 2.0,   // valid
            persistence: 0.5,  // valid
        },
        ..Default::default()
    };

    // This is a bit of a lazy check but it works well enough
    let err = generate_err(config);
    assert_eq!(err.to_string(), "invalid config");
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    let mut error_fields = validation_errors
        .errors()
        .keys()
        .copied()
        .collect::<Vec<&str>>();
    error_fields.sort_unstable();
    assert_eq!(
        error_fields,
        vec!["height", "noise", "width"],
        "incorrect validation errors in {:#?}",
        validation_errors
    );
}

#[test]
fn test_list_validation() {
    let mut config = MapConfig::default();
    config.paths[0].wiggle = 11.0;
    let err = generate_err(config);
    let validation_errors = err.downcast_ref::<ValidationErrors>().unwrap();
    assert!(validation_errors.field_errors().contains_key("wiggle"));
    // Context should point at the offending entry
    let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
    assert!(
        chain.contains(&"\"river\" path".to_owned()),
        "unexpected error chain {:?}",
        chain
    );
}

#[test]
fn test_jitter_bound() {
    let mut config = MapConfig::default();
    config.search.max_jitter = 1_000_000_000;
    config.paths[0].wiggle = 5.0;
    let err = generate_err(config);
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    assert!(validation_errors.errors().contains_key("search"));

    // The largest allowed jitter still generates
    let mut config = MapConfig::default();
    config.search.max_jitter = 1000;
    for path in &mut config.paths {
        path.wiggle = 10.0;
    }
    let map = TileMap::generate(config.clone(), &Atlas::default()).unwrap();
    assert_eq!(map.routes().len(), config.paths.len());
}

#[test]
fn test_unknown_fallback() {
    let mut config = MapConfig::default();
    config.biomes[1].fallback = Some("tundra".into());
    assert_eq!(
        config_error(config),
        ConfigError::UnknownBiome("tundra".into())
    );
}

#[test]
fn test_catch_all() {
    let mut config = MapConfig::default();
    config.biomes.pop();
    for biome in &mut config.biomes {
        biome.fallback = None;
    }
    assert_eq!(config_error(config), ConfigError::MissingCatchAll);

    let mut config = MapConfig::default();
    config.biomes.swap(1, 2);
    assert_eq!(
        config_error(config),
        ConfigError::CatchAllNotLast("grass".into())
    );
}

#[test]
fn test_fallback_cycle() {
    let biome = |label: &str, fallback: &str| BiomeConfig {
        label: label.into(),
        priority: 1,
        fallback: Some(fallback.into()),
        rule: BiomeRule::NoiseBelow {
            frequency: 1.0,
            seed_offset: 0,
            threshold: 0.0,
        },
        decoration: None,
        color: "#000000".into(),
    };
    let mut config = MapConfig::default();
    config.biomes.insert(0, biome("mud", "sand"));
    config.biomes.insert(1, biome("sand", "mud"));
    assert!(matches!(config_error(config), ConfigError::FallbackCycle(_)));
}

#[test]
fn test_missing_transition_art() {
    // Grass loses to water and has nowhere to go, so their pair needs art
    let atlas = Atlas::from_sheet_names(&[
        "transition_grass_desert.png",
        "transition_desert_water.png",
        "overlay_road.png",
        "overlay_river.png",
    ])
    .unwrap();
    let err = TileMap::generate(MapConfig::default(), &atlas).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingTransition(
            "water".into(),
            "grass".into()
        ))
    );
}

#[test]
fn test_missing_overlay_sheet() {
    let atlas = Atlas::from_sheet_names(&[
        "transition_grass_water.png",
        "transition_grass_desert.png",
        "overlay_river.png",
    ])
    .unwrap();
    let err = TileMap::generate(MapConfig::default(), &atlas).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingOverlaySheet("road".into()))
    );
}

#[test]
fn test_path_errors() {
    let mut config = MapConfig::default();
    config.paths[1].end = GridPoint::new(64, 32);
    assert_eq!(
        config_error(config),
        ConfigError::PointOutOfBounds {
            point: GridPoint::new(64, 32),
            width: 64,
            height: 64,
        }
    );

    let mut config = MapConfig::default();
    config.paths[0].kind = "canal".into();
    assert_eq!(
        config_error(config),
        ConfigError::UnknownOverlayKind("canal".into())
    );

    let mut config = MapConfig::default();
    config.paths[0].costs.insert("desert".into(), 0);
    assert_eq!(
        config_error(config),
        ConfigError::InvalidCost {
            kind: "river".into(),
            biome: "desert".into(),
            cost: 0,
        }
    );

    let mut config = MapConfig::default();
    config.paths[0].costs.insert("lava".into(), 3);
    assert_eq!(
        config_error(config),
        ConfigError::UnknownBiome("lava".into())
    );
}

#[test]
fn test_separation_needs_fallback() {
    let mut config = MapConfig::default();
    config.separations[0].demote = "grass".into();
    assert_eq!(
        config_error(config),
        ConfigError::MissingFallback("grass".into())
    );
}
