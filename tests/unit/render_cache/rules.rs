use super::*;

#[test]
fn default_rules_admit_everything() {
    let r = RenderCacheRules::default();
    assert!(r.matches(PixelSize::new(1, 1)));
    assert!(r.matches(PixelSize::new(u32::MAX, u32::MAX)));
}

#[test]
fn max_branch_is_inclusive() {
    let r = RenderCacheRules::max_only(100, 50);
    assert!(r.matches(PixelSize::new(100, 50)));
    assert!(!r.matches(PixelSize::new(101, 50)));
    assert!(!r.matches(PixelSize::new(100, 51)));
    assert!(r.matches(PixelSize::new(1, 1)));
}

#[test]
fn min_branch_is_inclusive() {
    let r = RenderCacheRules::min_only(64, 64);
    assert!(r.matches(PixelSize::new(64, 64)));
    assert!(r.matches(PixelSize::new(4096, 64)));
    assert!(!r.matches(PixelSize::new(63, 64)));
    assert!(!r.matches(PixelSize::new(10, 10)));
}

#[test]
fn branches_combine_with_or() {
    let r = RenderCacheRules {
        max_width: 10,
        max_height: 10,
        min_width: 500,
        min_height: 500,
    };
    assert!(r.matches(PixelSize::new(10, 10)));
    assert!(r.matches(PixelSize::new(600, 500)));
    assert!(!r.matches(PixelSize::new(100, 100)));
    // Small in one dimension, large in the other: neither branch holds.
    assert!(!r.matches(PixelSize::new(5, 600)));
}

#[test]
fn options_derive_from_config() {
    let config = CacheConfig {
        node_cache_enabled: false,
        node_cache_max_pixels: 512,
        node_cache_min_pixels: 2048,
        ..CacheConfig::default()
    };
    let o = RenderCacheOptions::from_config(&config);
    assert!(!o.enabled);
    assert_eq!(o.rules.max_width, 512);
    assert_eq!(o.rules.max_height, 512);
    assert_eq!(o.rules.min_width, 2048);
    assert_eq!(o.rules.min_height, 2048);
    assert!(RenderCacheOptions::default().enabled);
    assert!(!RenderCacheOptions::disabled().enabled);
}
