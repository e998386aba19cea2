use super::*;

#[test]
fn popcount_below_counts_lower_set_bits() {
    // branches 0, 3, 8 set.
    let mask = 0b0000_0001_0000_1001u16;
    assert_eq!(popcount_below(mask, 0), 0);
    assert_eq!(popcount_below(mask, 3), 1); // only branch 0 below 3
    assert_eq!(popcount_below(mask, 8), 2); // branches 0 and 3 below 8
    assert_eq!(popcount_below(mask, 9), 3);
}

#[test]
fn popcount_counts_total_set_bits() {
    assert_eq!(popcount(0), 0);
    assert_eq!(popcount(0xFFFF), 16);
    assert_eq!(popcount(0b1010_1010_1010_1010), 8);
}

#[test]
fn set_branches_iterates_in_ascending_order() {
    let mask = 0b0000_0001_0000_1001u16;
    let branches: Vec<u8> = set_branches(mask).collect();
    assert_eq!(branches, vec![0, 3, 8]);
}

#[test]
fn first_set_branch_none_on_empty_mask() {
    assert_eq!(first_set_branch(0), None);
    assert_eq!(first_set_branch(0b100), Some(2));
}

#[test]
fn check_branch_rejects_16_and_above() {
    assert!(check_branch(15).is_ok());
    assert!(check_branch(16).is_err());
}
