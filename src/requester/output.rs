//! Local output file for the requester.

use std::fs;
use std::io;
use std::path::Path;

/// The single line written for `bid`.
pub fn render(bid: &str) -> String {
    format!("Dólar: {}\n", bid)
}

/// Replace the contents of `path` with the rendered quote.
pub fn write_quote(path: &Path, bid: &str) -> io::Result<()> {
    fs::write(path, render(bid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cotacao.txt");

        write_quote(&path, "5.43").unwrap();
        write_quote(&path, "5.51").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Dólar: 5.51\n");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("cotacao.txt");
        assert!(write_quote(&path, "5.43").is_err());
    }
}
