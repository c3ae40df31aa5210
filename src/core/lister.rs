use std::process::{Command, Stdio};

use regex::Regex;

use super::{Device, EnumerationError};
use crate::config::Config;

/// Run the configured listing command and parse its output into devices.
///
/// Blocking; enumeration happens at startup and on explicit refresh only.
pub fn enumerate_devices(cfg: &Config) -> Result<Vec<Device>, EnumerationError> {
    let pattern = Regex::new(&cfg.list.pattern)?;

    let child = Command::new(&cfg.list.command)
        .args(&cfg.list.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| EnumerationError::Spawn {
            command: cfg.list.command.clone(),
            source,
        })?;
    let output = child.wait_with_output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    let marker = (!cfg.list.marker.is_empty()).then_some(cfg.list.marker.as_str());
    let devices = parse_device_lines(stdout.lines(), marker, &pattern);
    log::debug!(
        "{} device(s) parsed from `{}` output",
        devices.len(),
        cfg.list.command
    );
    Ok(devices)
}

/// Turn listing output into device records.
///
/// With a marker, any line containing it promotes the *next* line to a
/// candidate; a candidate that fails the pattern is logged and skipped
/// without aborting the scan. Without a marker every line is matched
/// directly. Records come out in discovery order.
pub fn parse_device_lines<'a, I>(lines: I, marker: Option<&str>, pattern: &Regex) -> Vec<Device>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut devices = Vec::new();
    match marker {
        Some(marker) => {
            let mut lines = lines.into_iter();
            while let Some(line) = lines.next() {
                if !line.contains(marker) {
                    continue;
                }
                let Some(candidate) = lines.next() else {
                    break;
                };
                match extract_device(pattern, candidate) {
                    Some(device) => devices.push(device),
                    None => log::warn!(
                        "line after {marker:?} marker did not match the device pattern: {candidate:?}"
                    ),
                }
            }
        }
        None => {
            devices.extend(lines.into_iter().filter_map(|line| extract_device(pattern, line)));
        }
    }
    devices
}

fn extract_device(pattern: &Regex, line: &str) -> Option<Device> {
    let caps = pattern.captures(line)?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

    let mut device = Device::new(
        group("path").unwrap_or_default(),
        group("size").unwrap_or_default(),
        group("modelName").unwrap_or_default(),
    );
    device.transport_type = group("transportType");
    device.logical_sector_size = group("logicalSectorSize");
    device.physical_sector_size = group("physicalSectorSize");
    device.partition_table_type = group("partitionTableType");
    Some(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListConfig;

    fn default_pattern() -> Regex {
        Regex::new(&ListConfig::default().pattern).unwrap()
    }

    #[test]
    fn parses_marker_and_data_line_pair() {
        let out = "BYT;\n/dev/sda:8GB:scsi:512:512:msdos:Generic Flash Disk;\n";
        let devices = parse_device_lines(out.lines(), Some("BYT"), &default_pattern());

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].path, "/dev/sda");
        assert_eq!(devices[0].size, "8GB");
        assert_eq!(devices[0].model_name, "Generic Flash Disk");
    }

    #[test]
    fn mismatched_data_line_is_skipped_without_aborting() {
        let out = "BYT;\nError: unreadable drive\nBYT;\n/dev/sdb:16GB:scsi:512:512:gpt:SanDisk Ultra;\n";
        let devices = parse_device_lines(out.lines(), Some("BYT"), &default_pattern());

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].path, "/dev/sdb");
    }

    #[test]
    fn marker_as_final_line_yields_nothing() {
        let devices = parse_device_lines("BYT;".lines(), Some("BYT"), &default_pattern());
        assert!(devices.is_empty());
    }

    #[test]
    fn markerless_mode_matches_every_line() {
        let out = "noise\n/dev/sda:8GB:scsi:512:512:msdos:Disk A;\n/dev/sdb:4GB:scsi:512:512:msdos:Disk B;\n";
        let devices = parse_device_lines(out.lines(), None, &default_pattern());

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].model_name, "Disk A");
        assert_eq!(devices[1].model_name, "Disk B");
    }

    #[test]
    fn devices_come_out_in_input_order() {
        let out = "BYT;\n/dev/sdz:1GB:scsi:512:512:msdos:Last Letter;\nBYT;\n/dev/sda:2GB:scsi:512:512:msdos:First Letter;\n";
        let devices = parse_device_lines(out.lines(), Some("BYT"), &default_pattern());

        let paths: Vec<&str> = devices.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["/dev/sdz", "/dev/sda"]);
    }

    #[test]
    fn empty_size_capture_still_emits_a_record() {
        let out = "BYT;\n/dev/sdc::scsi:512:512:msdos:Mystery Stick;\n";
        let devices = parse_device_lines(out.lines(), Some("BYT"), &default_pattern());

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].size, "");
        assert_eq!(devices[0].display_label(), "Mystery Stick");
    }

    #[test]
    fn extended_groups_are_captured_when_named() {
        let pattern = Regex::new(
            r"(?<path>.*):(?<size>.*):(?<transportType>.*):(?<logicalSectorSize>.*):(?<physicalSectorSize>.*):(?<partitionTableType>.*):(?<modelName>.*);",
        )
        .unwrap();
        let out = "/dev/sda:8GB:scsi:512:4096:gpt:Generic Flash Disk;";
        let devices = parse_device_lines(out.lines(), None, &pattern);

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].transport_type.as_deref(), Some("scsi"));
        assert_eq!(devices[0].logical_sector_size.as_deref(), Some("512"));
        assert_eq!(devices[0].physical_sector_size.as_deref(), Some("4096"));
        assert_eq!(devices[0].partition_table_type.as_deref(), Some("gpt"));
    }

    #[test]
    fn enumerate_runs_the_configured_command() {
        let mut cfg = Config::default();
        cfg.list.command = "sh".to_string();
        cfg.list.args = vec![
            "-c".to_string(),
            "printf 'BYT;\\n/dev/sda:8GB:scsi:512:512:msdos:Generic Flash Disk;\\n'".to_string(),
        ];

        let devices = enumerate_devices(&cfg).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].path, "/dev/sda");
    }

    #[test]
    fn enumerate_reports_spawn_failure() {
        let mut cfg = Config::default();
        cfg.list.command = "/definitely/not/a/real/command".to_string();

        match enumerate_devices(&cfg) {
            Err(EnumerationError::Spawn { command, .. }) => {
                assert_eq!(command, "/definitely/not/a/real/command");
            }
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[test]
    fn enumerate_reports_invalid_pattern() {
        let mut cfg = Config::default();
        cfg.list.pattern = "(?<path".to_string();

        assert!(matches!(
            enumerate_devices(&cfg),
            Err(EnumerationError::Pattern(_))
        ));
    }
}
