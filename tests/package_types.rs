// tests/package_types.rs

use builddag::types::{PackageType, FIXED_MIDDLE_PRIORITY};

#[test]
fn unlocked_priority_grows_with_dependents() {
    assert_eq!(PackageType::Unlocked.priority(0), 0);
    assert_eq!(PackageType::Unlocked.priority(1), 101);
    assert_eq!(PackageType::Unlocked.priority(7), 107);
}

#[test]
fn source_and_data_priority_is_fixed() {
    for dependents in [0, 1, 40] {
        assert_eq!(PackageType::Source.priority(dependents), FIXED_MIDDLE_PRIORITY);
        assert_eq!(PackageType::Data.priority(dependents), FIXED_MIDDLE_PRIORITY);
    }
}

#[test]
fn parsing_is_case_insensitive() {
    assert_eq!("Unlocked".parse::<PackageType>(), Ok(PackageType::Unlocked));
    assert_eq!(" source ".parse::<PackageType>(), Ok(PackageType::Source));
    assert_eq!("DATA".parse::<PackageType>(), Ok(PackageType::Data));
    assert!("managed".parse::<PackageType>().is_err());
}

#[test]
fn only_data_ignores_manifest_entry_changes() {
    assert!(PackageType::Unlocked.rebuilds_on_manifest_change());
    assert!(PackageType::Source.rebuilds_on_manifest_change());
    assert!(!PackageType::Data.rebuilds_on_manifest_change());
}
