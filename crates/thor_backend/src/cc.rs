//! Driving a system C compiler over the generated source.

use std::ffi::OsStr;
use std::process::{Command, Stdio};

#[derive(thiserror::Error, Debug)]
pub enum CcError {
    #[error("couldn't run C compiler: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "C compiler exited with code {code} and stderr output:\n{}",
        String::from_utf8_lossy(.stderr)
    )]
    Exited { code: i32, stderr: Vec<u8> },

    #[error(
        "C compiler terminated with stderr output:\n{}",
        String::from_utf8_lossy(.stderr))
    ]
    Terminated { stderr: Vec<u8> },

    #[error("no C compiler found on PATH (tried cc, gcc, clang, tcc)")]
    NotFound,
}

#[derive(Debug, Clone)]
pub enum Cc {
    System(&'static str),
    Custom(String, Vec<String>),
}

impl Cc {
    /// Probes the usual compiler names on `PATH`.
    pub fn detect() -> Result<Self, CcError> {
        for name in ["cc", "gcc", "clang", "tcc"] {
            let available = Command::new(name)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok();

            if available {
                return Ok(Self::System(name));
            }
        }

        Err(CcError::NotFound)
    }

    /// Compiles a single C source file to an executable.
    pub fn compile<P0: AsRef<OsStr>, P1: AsRef<OsStr>>(
        &self,
        c_file: P0,
        output: P1,
    ) -> Result<(), CcError> {
        let mut cmd = match self {
            Self::System(name) => Command::new(name),

            Self::Custom(cmd, args) => {
                let mut cmd = Command::new(cmd);
                cmd.args(args);
                cmd
            }
        };

        cmd.arg("-o");
        cmd.arg(output);
        cmd.arg(c_file);

        let output = cmd.output()?;

        if output.status.success() {
            Ok(())
        } else {
            match output.status.code() {
                Some(code) => Err(CcError::Exited {
                    code,
                    stderr: output.stderr,
                }),

                None => Err(CcError::Terminated {
                    stderr: output.stderr,
                }),
            }
        }
    }
}
