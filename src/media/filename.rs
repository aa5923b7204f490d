use super::types::Format;
use crate::utils::random_base36;

const FILENAME_PREFIX: &str = "tokgrab";

/// `tokgrab_<8 random chars>_<quality>.<ext>`; the extension always follows
/// the format's media kind.
pub fn generate_filename(format: &Format) -> String {
    format!(
        "{}_{}_{}.{}",
        FILENAME_PREFIX,
        random_base36(8),
        format.quality(),
        format.kind().extension()
    )
}
