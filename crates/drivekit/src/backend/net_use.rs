//! Real drive backend using `net use`.

use crate::backend::DriveBackend;
use crate::error::{Error, ErrorCategory, Result};
use crate::types::{ConnectionStatus, DriveLetter, MappedDrive, RemotePath};
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

static SYSTEM_ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"System error (\d+)").expect("valid regex"));

// `Label name        value`; labels are separated from values by 2+ spaces
static DETAIL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<label>\S.*?)\s{2,}(?P<value>\S.*?)\s*$").expect("valid regex")
});

/// Backend that executes real `net use` commands.
pub struct NetUseBackend {
    program: String,
}

impl NetUseBackend {
    pub fn new() -> Self {
        Self {
            program: "net".to_string(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        log::trace!("{} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute {}: {e}", self.program),
                stderr: String::new(),
            })
    }

    fn run_checked(&self, args: &[&str], letter: DriveLetter, remote: &str) -> Result<String> {
        let output = self.run(args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        match system_error_code(&stderr).or_else(|| system_error_code(&stdout)) {
            Some(code) => Err(Error::System {
                letter: letter.device(),
                remote: remote.to_string(),
                code,
            }),
            None => Err(Error::CommandFailed {
                message: format!("net use {} failed", letter.device()),
                stderr: stderr.trim().to_string(),
            }),
        }
    }
}

impl Default for NetUseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveBackend for NetUseBackend {
    fn list(&self) -> Result<Vec<MappedDrive>> {
        let output = self.run(&["use"])?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                message: "net use failed".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(parse_net_use(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Reads `net use X:`, which prints the remote name on its own line.
    fn query(&self, letter: DriveLetter) -> Result<Option<MappedDrive>> {
        let device = letter.device();
        match self.run_checked(&["use", &device], letter, "") {
            Ok(stdout) => Ok(parse_net_use_detail(letter, &stdout)),
            Err(e) if e.category() == ErrorCategory::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn map(&self, letter: DriveLetter, remote: &RemotePath) -> Result<()> {
        let device = letter.device();
        self.run_checked(
            &["use", &device, remote.as_str(), "/persistent:no"],
            letter,
            remote.as_str(),
        )?;
        Ok(())
    }

    fn unmap(&self, letter: DriveLetter) -> Result<()> {
        let device = letter.device();
        self.run_checked(&["use", &device, "/delete", "/y"], letter, "")?;
        Ok(())
    }
}

fn system_error_code(text: &str) -> Option<u32> {
    SYSTEM_ERROR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Column start offsets (in chars) of the `net use` table header.
struct Columns {
    local: usize,
    remote: usize,
    network: usize,
}

impl Columns {
    /// The header is the last non-blank line before the dashed rule. Only
    /// word positions are used, so localised headers work too.
    fn find(lines: &[&str]) -> Option<(Self, usize)> {
        let rule = lines.iter().position(|l| {
            let t = l.trim();
            !t.is_empty() && t.chars().all(|c| c == '-')
        })?;
        let header = lines[..rule].iter().rev().find(|l| !l.trim().is_empty())?;

        let mut starts = Vec::new();
        let mut previous = ' ';
        for (i, c) in header.chars().enumerate() {
            if !c.is_whitespace() && previous.is_whitespace() {
                starts.push(i);
            }
            previous = c;
        }
        match starts.as_slice() {
            [_, local, remote, network, ..] => Some((
                Self {
                    local: *local,
                    remote: *remote,
                    network: *network,
                },
                rule + 1,
            )),
            _ => None,
        }
    }
}

fn column(chars: &[char], from: usize, to: usize) -> String {
    let to = to.min(chars.len());
    if from >= to {
        return String::new();
    }
    chars[from..to].iter().collect::<String>().trim().to_string()
}

/// A row holding only the network name, pushed down by a long remote
fn is_continuation(line: &str, columns: &Columns) -> bool {
    let chars: Vec<char> = line.trim_end().chars().collect();
    chars.len() > columns.network && chars[..columns.network].iter().all(|c| c.is_whitespace())
}

/// Parse the table printed by a bare `net use`.
///
/// Remote names may contain spaces, so rows are cut at the header's column
/// offsets. A remote too long for its column pushes the network name onto
/// the next line, and then the remote is the rest of the row.
fn parse_net_use(output: &str) -> Vec<MappedDrive> {
    let lines: Vec<&str> = output.lines().collect();
    let Some((columns, first_row)) = Columns::find(&lines) else {
        return Vec::new();
    };

    let rows = &lines[first_row..];
    rows.iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let chars: Vec<char> = line.trim_end().chars().collect();
            let local = column(&chars, columns.local, columns.remote);
            let letter = local.strip_suffix(':')?.parse::<DriveLetter>().ok()?;

            let wrapped = rows
                .get(i + 1)
                .is_some_and(|next| is_continuation(next, &columns));
            let end = if wrapped { chars.len() } else { columns.network };
            let remote = column(&chars, columns.remote, end);
            if !remote.starts_with("\\\\") {
                return None;
            }

            Some(MappedDrive {
                letter,
                remote,
                status: ConnectionStatus::parse(&column(&chars, 0, columns.local)),
            })
        })
        .collect()
}

/// Parse the key/value listing printed by `net use X:`.
///
/// The remote is the first value that is a UNC path; the status is the
/// fourth entry (after local name, remote name and resource type).
fn parse_net_use_detail(letter: DriveLetter, output: &str) -> Option<MappedDrive> {
    let values: Vec<String> = output
        .lines()
        .filter_map(|line| DETAIL_LINE_RE.captures(line.trim_end()))
        .filter_map(|caps| caps.name("value").map(|m| m.as_str().to_string()))
        .collect();

    let remote = values.iter().find(|v| v.starts_with("\\\\"))?.clone();
    let status = values.get(3).map_or_else(
        || ConnectionStatus::Other(String::new()),
        |v| ConnectionStatus::parse(v),
    );

    Some(MappedDrive {
        letter,
        remote,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_USE: &str = concat!(
        "New connections will not be remembered.\r\n",
        "\r\n",
        "Status       Local     Remote                    Network\r\n",
        "\r\n",
        "-------------------------------------------------------------------------------\r\n",
        "OK           F:        \\\\fs01\\finance            Microsoft Windows Network\r\n",
        "Unavailable  H:        \\\\fs02\\home$\\jdoe         Microsoft Windows Network\r\n",
        "             S:        \\\\fs03\\scans              Microsoft Windows Network\r\n",
        "OK                     \\\\fs01\\IPC$               Microsoft Windows Network\r\n",
        "OK           P:        \\\\fs01\\Shared Files       Microsoft Windows Network\r\n",
        "OK           Z:        \\\\fs01\\department archive 2019\r\n",
        "                                                 Microsoft Windows Network\r\n",
        "The command completed successfully.\r\n",
    );

    const NET_USE_DETAIL: &str = concat!(
        "Local name        P:\r\n",
        "Remote name       \\\\fs01\\Shared Files\r\n",
        "Resource type     Disk\r\n",
        "Status            OK\r\n",
        "# Opens           0\r\n",
        "# Connections     1\r\n",
        "The command completed successfully.\r\n",
    );

    #[test]
    fn test_parse_net_use_table() {
        let drives = parse_net_use(NET_USE);
        assert_eq!(drives.len(), 5);

        assert_eq!(drives[0].letter.as_char(), 'F');
        assert_eq!(drives[0].remote, r"\\fs01\finance");
        assert_eq!(drives[0].status, ConnectionStatus::Ok);

        assert_eq!(drives[1].status, ConnectionStatus::Unavailable);
        assert_eq!(drives[1].remote, r"\\fs02\home$\jdoe");

        assert_eq!(drives[2].letter.as_char(), 'S');
        assert!(!drives[2].status.is_usable());
    }

    #[test]
    fn test_remote_names_with_spaces() {
        let drives = parse_net_use(NET_USE);
        let shared: RemotePath = r"\\fs01\Shared Files".parse().unwrap();

        assert_eq!(drives[3].letter.as_char(), 'P');
        assert_eq!(drives[3].remote, r"\\fs01\Shared Files");
        assert!(drives[3].satisfies(&shared));

        assert_eq!(drives[4].letter.as_char(), 'Z');
        assert_eq!(drives[4].remote, r"\\fs01\department archive 2019");
    }

    #[test]
    fn test_parse_net_use_detail() {
        let letter = DriveLetter::new('P').unwrap();
        let drive = parse_net_use_detail(letter, NET_USE_DETAIL).unwrap();
        assert_eq!(drive.letter, letter);
        assert_eq!(drive.remote, r"\\fs01\Shared Files");
        assert_eq!(drive.status, ConnectionStatus::Ok);
        assert!(drive.satisfies(&r"\\FS01\shared files".parse().unwrap()));

        assert!(parse_net_use_detail(letter, "The command completed successfully.\r\n").is_none());
    }

    #[test]
    fn test_parse_without_header_finds_nothing() {
        assert!(parse_net_use("There are no entries in the list.\r\n").is_empty());
    }

    #[test]
    fn test_system_error_code() {
        let stderr = "System error 85 has occurred.\r\n\r\nThe local device name is already in use.\r\n";
        let code = system_error_code(stderr).unwrap();
        assert_eq!(code, 85);
        assert_eq!(
            ErrorCategory::from_system_error(code),
            ErrorCategory::LetterInUse
        );
        assert_eq!(system_error_code("The command completed successfully."), None);
    }
}
