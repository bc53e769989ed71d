//! Barres de progression des étapes de conversion

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{bar:40.cyan/blue}] {pos}/{len} Geometries {percent}% ETA: {eta}";

/// Barre de progression sur `total` features, cachée si `visible` est faux
pub fn create_progress_bar(total: usize, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    eprintln!("{}", message);
    let pb = ProgressBar::new(total as u64);
    // Le template est une constante valide
    if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::default_bar().template(TEMPLATE).is_ok());
    }

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(500, "Test conversion", true);
        assert_eq!(pb.length(), Some(500));
        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_hidden_progress_bar() {
        let pb = create_progress_bar(10, "", false);
        assert!(pb.is_hidden());
    }
}
