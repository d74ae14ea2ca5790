use crate::strand::Conversion;
use crate::types::EditDistance;

/// Count differing columns between an aligned read and reference, ignoring
/// `N` on either side and the substitution bisulfite treatment is expected
/// to produce on this strand. Gap columns count as differences.
pub fn count_mismatches(read: &[u8], reference: &[u8], tolerated: Conversion) -> EditDistance {
    let allowed = (tolerated.read_base(), tolerated.reference_base());
    read.iter()
        .zip(reference)
        .filter(|&(&r, &g)| r != g && r != b'N' && g != b'N' && (r, g) != allowed)
        .count() as EditDistance
}
