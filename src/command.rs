use crate::recipe::RecipeOptions;
use crate::source::SourceImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

/// Appended to the source stem to name the converted file.
pub const OUTPUT_SUFFIX: &str = "_rawji";
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Where the converter writes its result for `image` inside `temp_dir`.
pub fn output_path_for(temp_dir: &Path, image: &SourceImage) -> PathBuf {
    temp_dir.join(format!("{}{}.{}", image.stem(), OUTPUT_SUFFIX, OUTPUT_EXTENSION))
}

/// Quote a path for display as a single shell word.
///
/// The string is always wrapped in double quotes. On Unix the characters a
/// POSIX shell still interprets inside double quotes (`"`, `\`, `$` and the
/// backtick) are backslash escaped. On Windows `cmd.exe` has no escape
/// inside quotes, so embedded quotes are doubled and `%` is escaped.
pub fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for ch in raw.chars() {
        if cfg!(windows) {
            match ch {
                '"' => quoted.push_str("\"\""),
                '%' => quoted.push_str("^%"),
                _ => quoted.push(ch),
            }
        } else {
            match ch {
                '"' | '\\' | '$' | '`' => {
                    quoted.push('\\');
                    quoted.push(ch);
                }
                _ => quoted.push(ch),
            }
        }
    }
    quoted.push('"');
    quoted
}

/// One converter invocation: executable, recipe flags, input and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionCommand {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionCommand {
    pub fn new(
        executable: &Path,
        recipe: &RecipeOptions,
        image: &SourceImage,
        temp_dir: &Path,
    ) -> Self {
        Self {
            executable: executable.to_path_buf(),
            arguments: recipe.arguments(),
            input: image.path().to_path_buf(),
            output: output_path_for(temp_dir, image),
        }
    }

    /// Build the child process. Arguments are handed over as separate argv
    /// entries, so no shell ever parses the paths.
    pub fn to_process_command(&self) -> ProcessCommand {
        let mut cmd = ProcessCommand::new(&self.executable);
        cmd.args(&self.arguments).arg(&self.input).arg(&self.output);
        cmd
    }
}

impl fmt::Display for ConversionCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.executable.display())?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        write!(f, " {} {}", quote_path(&self.input), quote_path(&self.output))
    }
}
