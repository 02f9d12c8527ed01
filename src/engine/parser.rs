//! Interpretation of engine text output.
//!
//! Scan output is matched in a fixed order; the first rule that applies
//! decides the verdict:
//!
//! 1. a `FOUND` marker means infected, named by the token before it;
//!    the marker only counts as the last word of a line, so a scanned
//!    file whose name contains `FOUND` is not a detection;
//! 2. `OK` or `Clean` means clean;
//! 3. a non-empty error stream means the scan was inconclusive;
//! 4. anything else is treated as clean.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::verdict::UNKNOWN_VIRUS_NAME;

static FOUND_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[ \t])FOUND[ \t\r]*$").expect("FOUND marker pattern is valid")
});

static FOUND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(\S+)[ \t]+FOUND[ \t\r]*$").expect("FOUND pattern is valid")
});

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ClamAV\s+([^/\s]+)(?:/(\d+)(?:/(.+))?)?").expect("version pattern is valid")
});

/// What a scan's output says about the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    /// A signature matched.
    Infected(String),
    /// The engine reported the file clean.
    Clean,
    /// No verdict marker, but the engine complained on stderr.
    Inconclusive(String),
    /// No verdict marker and nothing on stderr.
    Ambiguous,
}

/// Classifies the output of a scan command.
pub fn parse_scan_output(stdout: &str, stderr: &str) -> ParsedOutput {
    if has_detection(stdout) {
        return ParsedOutput::Infected(extract_virus_name(stdout));
    }

    if stdout.contains("OK") || stdout.contains("Clean") {
        return ParsedOutput::Clean;
    }

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return ParsedOutput::Inconclusive(stderr.to_string());
    }

    ParsedOutput::Ambiguous
}

/// Returns `true` if any line of `stdout` ends with the `FOUND` marker.
pub fn has_detection(stdout: &str) -> bool {
    FOUND_MARKER.is_match(stdout)
}

/// Extracts the signature name preceding the first `FOUND` marker.
fn extract_virus_name(output: &str) -> String {
    FOUND_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !name.ends_with(':'))
        .unwrap_or(UNKNOWN_VIRUS_NAME)
        .to_string()
}

/// Fields of a `ClamAV <engine>/<database>/<date>` version line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    /// Engine version.
    pub engine_version: Option<String>,
    /// Signature database version.
    pub database_version: Option<String>,
    /// Signature database date.
    pub database_date: Option<String>,
}

/// Parses the output of the engine's version command.
pub fn parse_version_output(output: &str) -> Option<VersionInfo> {
    let caps = VERSION_LINE.captures(output)?;
    Some(VersionInfo {
        engine_version: caps.get(1).map(|m| m.as_str().to_string()),
        database_version: caps.get(2).map(|m| m.as_str().to_string()),
        database_date: caps.get(3).map(|m| m.as_str().trim().to_string()),
    })
}

/// Fields reported by the signature-database inspection command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseInfo {
    /// Database version.
    pub version: Option<String>,
    /// Build timestamp as printed.
    pub build_time: Option<String>,
    /// Number of signatures.
    pub signatures: Option<u64>,
}

/// Parses `Key: value` database metadata; unknown or malformed lines are skipped.
pub fn parse_database_info(output: &str) -> DatabaseInfo {
    let mut info = DatabaseInfo::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "Version" => info.version = Some(value.to_string()),
            "Build time" => info.build_time = Some(value.to_string()),
            "Signatures" => info.signatures = value.parse().ok(),
            _ => {}
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_extracts_name() {
        assert_eq!(
            parse_scan_output("MyVirus FOUND", ""),
            ParsedOutput::Infected("MyVirus".into())
        );
        assert_eq!(
            parse_scan_output("/srv/uploads/a.exe: Win.Test.EICAR_HDB-1 FOUND\n", ""),
            ParsedOutput::Infected("Win.Test.EICAR_HDB-1".into())
        );
    }

    #[test]
    fn test_found_without_name_is_unknown() {
        assert_eq!(
            parse_scan_output("FOUND", ""),
            ParsedOutput::Infected("Unknown".into())
        );
        assert_eq!(
            parse_scan_output("/tmp/a: FOUND", ""),
            ParsedOutput::Infected("Unknown".into())
        );
    }

    #[test]
    fn test_found_beats_ok() {
        let out = "/tmp/a.txt: OK\n/tmp/b.exe: Eicar-Signature FOUND\n";
        assert_eq!(
            parse_scan_output(out, ""),
            ParsedOutput::Infected("Eicar-Signature".into())
        );
    }

    #[test]
    fn test_found_in_filename_is_not_a_detection() {
        assert_eq!(
            parse_scan_output("/srv/temp/1f2e_LOST_AND_FOUND.txt: OK\n", ""),
            ParsedOutput::Clean
        );
        assert_eq!(
            parse_scan_output("/srv/temp/FOUNDATION.pdf: OK", ""),
            ParsedOutput::Clean
        );
        assert!(!has_detection("/srv/temp/a_FOUND: OK"));
        assert!(has_detection("/srv/temp/a_FOUND: Eicar FOUND\r\n"));
    }

    #[test]
    fn test_ok_and_clean_markers() {
        assert_eq!(parse_scan_output("/tmp/a.txt: OK", ""), ParsedOutput::Clean);
        assert_eq!(parse_scan_output("Clean", "some warning"), ParsedOutput::Clean);
    }

    #[test]
    fn test_stderr_without_marker_is_inconclusive() {
        assert_eq!(
            parse_scan_output("", "  LibClamAV Error: cli_loaddb failed\n"),
            ParsedOutput::Inconclusive("LibClamAV Error: cli_loaddb failed".into())
        );
    }

    #[test]
    fn test_empty_output_is_ambiguous() {
        assert_eq!(parse_scan_output("", ""), ParsedOutput::Ambiguous);
        assert_eq!(parse_scan_output("scanning...", "   "), ParsedOutput::Ambiguous);
    }

    #[test]
    fn test_parse_full_version() {
        let info = parse_version_output("ClamAV 1.0.3/27103/Mon Oct 16 07:35:12 2023\n").unwrap();
        assert_eq!(info.engine_version.as_deref(), Some("1.0.3"));
        assert_eq!(info.database_version.as_deref(), Some("27103"));
        assert_eq!(info.database_date.as_deref(), Some("Mon Oct 16 07:35:12 2023"));
    }

    #[test]
    fn test_parse_bare_version() {
        let info = parse_version_output("ClamAV 0.103.8").unwrap();
        assert_eq!(info.engine_version.as_deref(), Some("0.103.8"));
        assert_eq!(info.database_version, None);
        assert!(parse_version_output("command not found").is_none());
    }

    #[test]
    fn test_parse_database_info() {
        let out = "File: /var/lib/clamav/daily.cld\n\
                   Build time: 16 Oct 2023 07:35 -0400\n\
                   Version: 27103\n\
                   Signatures: 2045678\n\
                   Functionality level: 90\n";
        let info = parse_database_info(out);
        assert_eq!(info.version.as_deref(), Some("27103"));
        assert_eq!(info.build_time.as_deref(), Some("16 Oct 2023 07:35 -0400"));
        assert_eq!(info.signatures, Some(2_045_678));
    }

    #[test]
    fn test_parse_database_info_degrades() {
        let info = parse_database_info("Signatures: lots\ngarbage\nVersion:\n");
        assert_eq!(info, DatabaseInfo::default());
    }
}
