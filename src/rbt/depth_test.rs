use super::*;

#[test]
fn test_depth() {
    let mut depth = Depth::default();
    assert_eq!(depth.to_samples(), 0);
    assert_eq!(depth.to_min(), 0);
    assert_eq!(depth.to_mean(), 0);

    for d in [1, 2, 2, 3, 3, 3, 4].iter() {
        depth.sample(*d);
    }
    assert_eq!(depth.to_samples(), 7);
    assert_eq!(depth.to_min(), 1);
    assert_eq!(depth.to_max(), 4);
    assert_eq!(depth.to_mean(), 18 / 7);

    let percentiles = depth.to_percentiles();
    assert!(!percentiles.is_empty());
    assert!(!format!("{}", depth).is_empty());
}
