//! Call-stack snapshots.
//!
//! A [`Stack`] is an immutable text capture of the call stack, one frame per
//! line, taken when it is created. Errors take their snapshot at
//! construction, so a report emitted much later still points at the place
//! where the failure happened.
//!
//! Captures are bounded: frames are appended until the next one would push
//! the capture past [`MAX_STACK_BYTES`], and the rest are dropped.
//!
//! # Frame format
//!
//! Each line is the demangled symbol, followed by its source location when
//! debug info is available:
//!
//! ```text
//! my_app::load_config ([..]/my_app/src/config.rs:42)
//! ```
//!
//! Frames without symbol information are rendered as their instruction
//! pointer.
//!
//! Frames are only as accurate as the binary's debug info. In release builds
//! without it, inlined and tail-called functions vanish from the capture, so
//! the first frame after the skipped ones may be a caller further up (often
//! `core::ops::function::FnOnce::call_once`) rather than the function that
//! built the error. The two skipped frames are still the capture routine and
//! its constructor, since both are `#[inline(never)]`.
//!
//! # Environment Variables
//!
//! - `RUST_BACKTRACE=full` - Show full source paths
//! - `ROOTLINE_STACK` - Comma-separated options:
//!   - `full_paths` - Show full source paths
//!   - `short_symbols` - Show only the function name instead of the full
//!     symbol path

use std::{
    borrow::Cow,
    fmt::{self, Write as _},
    sync::{Arc, OnceLock},
};

/// The upper bound on the size of a captured stack.
pub const MAX_STACK_BYTES: usize = 1024 * 1024;

/// The number of leading frames that belong to the capture itself and are
/// left out of backtrace lines.
pub const SKIPPED_FRAMES: usize = 2;

/// An immutable snapshot of the call stack.
///
/// Cloning is cheap; clones share the same capture.
#[derive(Clone, PartialEq, Eq)]
pub struct Stack(Arc<str>);

#[derive(Debug)]
struct StackEnvOptions {
    full_paths: bool,
    short_symbols: bool,
}

impl StackEnvOptions {
    fn get() -> &'static Self {
        static ROOTLINE_STACK_FLAGS: OnceLock<StackEnvOptions> = OnceLock::new();

        ROOTLINE_STACK_FLAGS.get_or_init(|| {
            let mut full_paths =
                std::env::var_os("RUST_BACKTRACE").is_some_and(|var| var == "full");
            let mut short_symbols = false;

            if let Some(var) = std::env::var_os("ROOTLINE_STACK") {
                for v in var.to_string_lossy().split(',') {
                    if v.eq_ignore_ascii_case("full_paths") {
                        full_paths = true;
                    } else if v.eq_ignore_ascii_case("short_symbols") {
                        short_symbols = true;
                    }
                }
            }

            StackEnvOptions {
                full_paths,
                short_symbols,
            }
        })
    }
}

impl Stack {
    /// Captures the current call stack.
    ///
    /// The first line is always this function and the second its caller.
    #[inline(never)]
    pub fn capture() -> Self {
        let options = StackEnvOptions::get();
        let mut text = String::new();
        let mut in_backtrace_crate = true;
        let mut truncated = false;

        backtrace::trace(|frame| {
            let mut resolved = false;
            backtrace::resolve_frame(frame, |symbol| {
                resolved = true;
                if truncated {
                    return;
                }

                let name = symbol.name().map(|sym| format!("{sym:#}"));
                if in_backtrace_crate {
                    if name.as_deref().is_some_and(|name| name.starts_with("backtrace::")) {
                        return;
                    }
                    in_backtrace_crate = false;
                }

                let mut line = match &name {
                    Some(name) if options.short_symbols => function_name(name).to_owned(),
                    Some(name) => name.clone(),
                    None => format!("{:?}", frame.ip()),
                };
                if let Some(path) = symbol.filename() {
                    let path = path.to_string_lossy();
                    let path = if options.full_paths {
                        path
                    } else {
                        shorten_path(&path).into_owned().into()
                    };
                    let _ = match symbol.lineno() {
                        Some(lineno) => write!(line, " ({path}:{lineno})"),
                        None => write!(line, " ({path})"),
                    };
                }

                truncated = !push_line(&mut text, &line);
            });

            if !resolved && !in_backtrace_crate && !truncated {
                truncated = !push_line(&mut text, &format!("{:?}", frame.ip()));
            }

            !truncated
        });

        Self(text.into())
    }

    /// The captured text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The captured text as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Iterates over every captured frame, one line each.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }

    /// Iterates over the frames that belong to the caller, skipping the first
    /// [`SKIPPED_FRAMES`] lines.
    pub fn backtrace_lines(&self) -> impl Iterator<Item = &str> {
        self.lines().skip(SKIPPED_FRAMES)
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Stack {
    fn from(text: String) -> Self {
        Self(text.into())
    }
}

impl From<&str> for Stack {
    fn from(text: &str) -> Self {
        Self(text.into())
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("frames", &self.lines().count())
            .field("bytes", &self.0.len())
            .finish()
    }
}

/// Appends `line` unless it would exceed [`MAX_STACK_BYTES`].
fn push_line(text: &mut String, line: &str) -> bool {
    let needed = line.len() + usize::from(!text.is_empty());
    if text.len() + needed > MAX_STACK_BYTES {
        return false;
    }
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
    true
}

/// Replaces well-known path prefixes (the Rust sources, the cargo registry)
/// with `[..]`.
fn shorten_path(path: &str) -> Cow<'_, str> {
    static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
    let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
        [
            regex::Regex::new(
                r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
            )
            .expect("built-in regex pattern for std library paths should be valid"),
            regex::Regex::new(
                r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
            )
            .expect("built-in regex pattern for cargo registry paths should be valid"),
        ]
    });

    for regex in [std_regex, registry_regex] {
        if let Some(crate_capture) = regex.captures(path).and_then(|captures| captures.get(1)) {
            return Cow::Owned(format!("[..]/{}", &path[crate_capture.start()..]));
        }
    }
    Cow::Borrowed(path)
}

/// Extracts the bare function name from a demangled symbol, e.g. `load` from
/// `<my_app::Config as my_app::Load>::load`.
fn function_name(s: &str) -> &str {
    let mut word_start = 0usize;
    let mut word_end = 0usize;
    let mut angle_nesting_level = 0u64;
    let mut curly_nesting_level = 0u64;
    let mut potential_function_arrow = false;
    let mut inside_word = false;

    for (i, c) in s.char_indices() {
        if curly_nesting_level == 0 && angle_nesting_level == 0 {
            if !inside_word && unicode_ident::is_xid_start(c) {
                word_start = i;
                inside_word = true;
            } else if inside_word && !unicode_ident::is_xid_continue(c) {
                word_end = i;
                inside_word = false;
            }
        }

        let was_potential_function_arrow = potential_function_arrow;
        potential_function_arrow = c == '-';

        if c == '<' {
            angle_nesting_level = angle_nesting_level.saturating_add(1);
        } else if c == '>' && !was_potential_function_arrow {
            angle_nesting_level = angle_nesting_level.saturating_sub(1);
        } else if c == '{' {
            curly_nesting_level = curly_nesting_level.saturating_add(1);
            if !inside_word && curly_nesting_level == 1 && angle_nesting_level == 0 {
                word_start = i;
                inside_word = true;
            }
        } else if c == '}' {
            curly_nesting_level = curly_nesting_level.saturating_sub(1);
            if inside_word && curly_nesting_level == 0 {
                word_end = i + 1;
                inside_word = false;
            }
        }
    }

    if word_start < word_end {
        &s[word_start..word_end]
    } else {
        &s[word_start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn capture_from_named_site() -> Stack {
        Stack::capture()
    }

    #[test]
    fn test_capture_starts_at_capture() {
        let stack = capture_from_named_site();
        let mut lines = stack.lines();

        assert!(lines.next().unwrap().contains("capture"));
        assert!(lines.next().unwrap().contains("capture_from_named_site"));
        assert!(stack.as_str().contains("test_capture_starts_at_capture"));
    }

    #[test]
    fn test_backtrace_lines_skip_two() {
        let stack = Stack::from("capture\nconstructor\ncaller\nmain");
        assert_eq!(
            stack.backtrace_lines().collect::<Vec<_>>(),
            ["caller", "main"]
        );

        let short = Stack::from("capture");
        assert_eq!(short.backtrace_lines().count(), 0);
    }

    #[test]
    fn test_capture_is_bounded() {
        let stack = Stack::capture();
        assert!(!stack.is_empty());
        assert!(stack.as_bytes().len() <= MAX_STACK_BYTES);
    }

    #[test]
    fn test_push_line_refuses_overflow() {
        let mut text = "x".repeat(MAX_STACK_BYTES - 2);
        assert!(push_line(&mut text, "y"));
        assert!(!push_line(&mut text, "z"));
        assert_eq!(text.len(), MAX_STACK_BYTES);
    }

    #[test]
    fn test_clones_share_the_capture() {
        let stack = Stack::capture();
        let clone = stack.clone();
        assert_eq!(stack, clone);
        assert_eq!(stack.as_str(), clone.as_str());
    }

    #[test]
    fn test_shorten_path() {
        assert_eq!(
            shorten_path(
                "/home/user/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/regex-1.12.2/src/lib.rs"
            ),
            "[..]/regex-1.12.2/src/lib.rs"
        );
        assert_eq!(
            shorten_path(
                "/rustc/17067e9ac6d7e98f18d4a1d0e0d4a4e4f4b2ab2c/library/std/src/thread/mod.rs"
            ),
            "[..]/std/src/thread/mod.rs"
        );
        assert_eq!(shorten_path("src/main.rs"), "src/main.rs");
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("my_app::config::load"), "load");
        assert_eq!(
            function_name("<my_app::Config as my_app::Load>::load"),
            "load"
        );
        assert_eq!(
            function_name("my_app::run::{{closure}}"),
            "{{closure}}"
        );
        assert_eq!(function_name("main"), "main");
    }
}
