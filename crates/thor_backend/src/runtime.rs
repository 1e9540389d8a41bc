//! The built-in runtime shims spliced into generated C.
//!
//! Only the helpers a program actually uses are emitted; [`Helper`]'s
//! `Ord` fixes their order in the output so generation is
//! deterministic.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum Helper {
    Format,
    StrEq,
    Print,
    Println,
    Input,
}

impl Helper {
    /// The C symbol the helper defines.
    pub fn symbol(self) -> &'static str {
        match self {
            Helper::Format => "thor_format",
            Helper::StrEq => "thor_str_eq",
            Helper::Print => "thor_print",
            Helper::Println => "thor_println",
            Helper::Input => "thor_input",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Helper::Format => {
                r#"static char *thor_format(const char *fmt, ...) {
    va_list args;
    va_start(args, fmt);
    int len = vsnprintf(NULL, 0, fmt, args);
    va_end(args);
    char *out = malloc((size_t)len + 1);
    va_start(args, fmt);
    vsnprintf(out, (size_t)len + 1, fmt, args);
    va_end(args);
    return out;
}
"#
            }

            Helper::StrEq => {
                r#"static int thor_str_eq(const char *a, const char *b) {
    return strcmp(a, b) == 0;
}
"#
            }

            Helper::Print => {
                r#"static void thor_print(const char *s) {
    printf("%s", s);
    fflush(stdout);
}
"#
            }

            Helper::Println => {
                r#"static void thor_println(const char *s) {
    printf("%s\n", s);
}
"#
            }

            Helper::Input => {
                r#"static char *thor_input(const char *prompt) {
    printf("%s", prompt);
    fflush(stdout);
    char buffer[1024];
    if (!fgets(buffer, sizeof buffer, stdin)) {
        buffer[0] = '\0';
    }
    buffer[strcspn(buffer, "\n")] = '\0';
    char *line = malloc(strlen(buffer) + 1);
    strcpy(line, buffer);
    return line;
}
"#
            }
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
