//! What a query does with a confirmed response: either append the candidate
//! to a running log (`HeadAction`) or persist its body to its own file
//! (`GetAction`).

use crate::util::sanitize_filename;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct HeadAction {
    verbose: bool,
    file: RefCell<std::fs::File>,
}

impl HeadAction {
    pub fn new(path: &str, verbose: bool) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {path}"))?;
        Ok(HeadAction {
            verbose,
            file: RefCell::new(file),
        })
    }

    pub fn process(&self, status_code: u16, candidate: &str) -> Result<()> {
        if (200..300).contains(&status_code) {
            writeln!(self.file.borrow_mut(), "{candidate}")?;
        }
        if self.verbose {
            println!("{candidate}: {status_code}");
        }
        Ok(())
    }
}

pub struct GetAction {
    verbose: bool,
    path_dir: PathBuf,
    screen: String,
}

impl GetAction {
    pub fn new(path_dir: &str, screen: &str, verbose: bool) -> Result<Self> {
        fs::create_dir_all(path_dir).with_context(|| format!("creating {path_dir}"))?;
        Ok(GetAction {
            verbose,
            path_dir: PathBuf::from(path_dir),
            screen: screen.to_string(),
        })
    }

    pub fn process(&self, status_code: u16, contents: &[u8], candidate: &str) -> Result<()> {
        if self.verbose {
            let text = String::from_utf8_lossy(contents);
            println!("[ ] Response from {candidate}:\n{text}");
            self.write_out(contents, candidate)?;
        } else if (200..300).contains(&status_code) {
            self.write_out(contents, candidate)?;
        }
        Ok(())
    }

    fn write_out(&self, contents: &[u8], candidate: &str) -> Result<()> {
        if !self.screen.is_empty() {
            let text = String::from_utf8_lossy(contents);
            if text.contains(&self.screen) {
                return Ok(());
            }
        }
        let path = self.path_dir.join(sanitize_filename(candidate));
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.write_all(contents)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn head_action_only_logs_2xx() {
        let dir = std::env::temp_dir().join(format!("abrader-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let log_path = dir.join("found.log");
        let action = HeadAction::new(log_path.to_str().unwrap(), false).unwrap();
        action.process(200, "/a").unwrap();
        action.process(404, "/b").unwrap();
        let logged = fs::read_to_string(&log_path).unwrap();
        assert_eq!(logged, "/a\n");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn get_action_skips_writes_that_contain_the_screen_string() {
        let dir = std::env::temp_dir().join(format!("abrader-test-get-{}", std::process::id()));
        let action = GetAction::new(dir.to_str().unwrap(), "not found", false).unwrap();
        action.process(200, b"resource not found here", "/a").unwrap();
        action.process(200, b"here is the resource", "/b").unwrap();
        assert!(!dir.join(sanitize_filename("/a")).exists());
        assert!(dir.join(sanitize_filename("/b")).exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn get_action_appends_trailing_newline_to_persisted_body() {
        let dir = std::env::temp_dir().join(format!("abrader-test-nl-{}", std::process::id()));
        let action = GetAction::new(dir.to_str().unwrap(), "", false).unwrap();
        action.process(200, b"abc", "/x").unwrap();
        let persisted = fs::read(dir.join(sanitize_filename("/x"))).unwrap();
        assert_eq!(persisted, b"abc\n");
        fs::remove_dir_all(&dir).ok();
    }
}
