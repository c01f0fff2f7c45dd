//! Property-based tests for the harness configuration

use proptest::prelude::*;
use rdpharness_core::HarnessConfig;

// Strategy for generating valid resolutions
fn arb_resolution() -> impl Strategy<Value = (u16, u16)> {
    prop_oneof![
        Just((640, 480)),
        Just((800, 600)),
        Just((1024, 768)),
        Just((1280, 720)),
        Just((1920, 1080)),
        (320u16..=3840, 240u16..=2160),
    ]
}

// Strategy for generating valid color depths
fn arb_color_depth() -> impl Strategy<Value = u8> {
    prop_oneof![Just(16u8), Just(24u8), Just(32u8)]
}

fn arb_config() -> impl Strategy<Value = HarnessConfig> {
    (
        arb_resolution(),
        arb_color_depth(),
        1u64..=60_000,
        1u64..=1000,
    )
        .prop_map(
            |((width, height), color_depth, input_wait_ms, step_interval_ms)| HarnessConfig {
                width,
                height,
                color_depth,
                input_wait_ms,
                step_interval_ms,
            },
        )
}

proptest! {
    #[test]
    fn prop_config_toml_round_trip(config in arb_config()) {
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: HarnessConfig = toml::from_str(&serialized).unwrap();
        prop_assert_eq!(config, deserialized);
    }

    #[test]
    fn prop_builder_matches_struct(
        (width, height) in arb_resolution(),
        depth in arb_color_depth(),
    ) {
        let built = HarnessConfig::new()
            .with_resolution(width, height)
            .with_color_depth(depth);
        prop_assert_eq!(built.width, width);
        prop_assert_eq!(built.height, height);
        prop_assert_eq!(built.color_depth, depth);
    }
}

#[test]
fn test_missing_optional_fields_use_defaults() {
    let parsed: HarnessConfig = toml::from_str(
        "width = 800\nheight = 600\ncolor_depth = 32\n",
    )
    .unwrap();
    assert_eq!(parsed.input_wait_ms, 2000);
    assert_eq!(parsed.step_interval_ms, 16);
}
