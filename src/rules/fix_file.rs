//! Opens the file a compiler or interpreter complained about in `$EDITOR`,
//! at the reported line, then re-runs the failed command.

use super::{NewCommand, Rule};
use crate::providers::SystemProvider;
use crate::types::Command;
use anyhow::{anyhow, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Error location formats, tried in order. Earlier entries are more specific.
const LOCATION_PATTERNS: &[&str] = &[
    // js, node
    "^    at {file}:{line}:{col}",
    // cargo
    "^   {file}:{line}:{col}",
    // python
    "^  File \"{file}\", line {line}",
    // awk
    "^awk: {file}:{line}:",
    // git
    "^fatal: bad config file line {line} in {file}",
    // llc
    "^llc: {file}:{line}:{col}:",
    // lua
    "^lua: {file}:{line}:",
    // fish
    r"^{file} \(line {line}\):",
    // bash, sh, ssh
    "^{file}: line {line}: ",
    // cargo, clang, gcc, go, pep8, rustc
    "^{file}:{line}:{col}",
    // ghc, make, ruby, zsh
    "^{file}:{line}:",
    // perl
    "at {file} line {line}",
];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LOCATION_PATTERNS
        .iter()
        .map(|pattern| {
            let pattern = pattern
                .replace("{file}", r"(?P<file>[^:\n]+)")
                .replace("{line}", r"(?P<line>[0-9]+)")
                .replace("{col}", r"(?P<col>[0-9]+)");
            Regex::new(&format!("(?m){}", pattern)).expect("valid location pattern")
        })
        .collect()
});

pub struct FixFile {
    system: Arc<dyn SystemProvider>,
    fix_line_cmd: String,
    fix_col_cmd: Option<String>,
}

impl FixFile {
    pub fn new(system: Arc<dyn SystemProvider>, fix_line_cmd: String, fix_col_cmd: Option<String>) -> Self {
        Self {
            system,
            fix_line_cmd,
            fix_col_cmd,
        }
    }

    /// First location whose file exists on disk.
    fn search<'o>(&self, output: &'o str) -> Option<Captures<'o>> {
        PATTERNS
            .iter()
            .filter_map(|pattern| pattern.captures(output))
            .find(|captures| self.system.is_file(Path::new(&captures["file"])))
    }
}

impl Rule for FixFile {
    fn name(&self) -> &str {
        "fix_file"
    }

    fn is_match(&self, command: &Command) -> Result<bool> {
        if self.system.env_var("EDITOR").is_none() {
            return Ok(false);
        }
        Ok(self.search(command.output()).is_some())
    }

    fn get_new_command(&self, command: &Command) -> Result<NewCommand> {
        let editor = self
            .system
            .env_var("EDITOR")
            .ok_or_else(|| anyhow!("EDITOR is not set"))?;
        let location = self
            .search(command.output())
            .ok_or_else(|| anyhow!("no file location in output"))?;

        let template = match (&self.fix_col_cmd, location.name("col")) {
            (Some(col_cmd), Some(_)) => col_cmd,
            _ => &self.fix_line_cmd,
        };
        let editor_call = template
            .replace("{editor}", &editor)
            .replace("{file}", &location["file"])
            .replace("{line}", &location["line"])
            .replace("{col}", location.name("col").map_or("", |col| col.as_str()));

        Ok(format!("{} && {}", editor_call, command.script()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::MockSystem;

    struct Case {
        script: &'static str,
        file: &'static str,
        line: u32,
        col: Option<u32>,
        output: &'static str,
    }

    const CASES: &[Case] = &[
        Case {
            script: "gcc a.c",
            file: "a.c",
            line: 3,
            col: Some(1),
            output: "\na.c: In function 'main':\na.c:3:1: error: expected expression before '}' token\n }\n  ^\n",
        },
        Case {
            script: "clang a.c",
            file: "a.c",
            line: 3,
            col: Some(1),
            output: "\na.c:3:1: error: expected expression\n}\n^\n",
        },
        Case {
            script: "perl a.pl",
            file: "a.pl",
            line: 3,
            col: None,
            output: "\nsyntax error at a.pl line 3, at EOF\nExecution of a.pl aborted due to compilation errors.\n",
        },
        Case {
            script: "perl a.pl",
            file: "a.pl",
            line: 2,
            col: None,
            output: "\nSearch pattern not terminated at a.pl line 2.\n",
        },
        Case {
            script: "sh a.sh",
            file: "a.sh",
            line: 2,
            col: None,
            output: "\na.sh: line 2: foo: command not found\n",
        },
        Case {
            script: "zsh a.sh",
            file: "a.sh",
            line: 2,
            col: None,
            output: "\na.sh:2: command not found: foo\n",
        },
        Case {
            script: "rustc a.rs",
            file: "a.rs",
            line: 2,
            col: Some(5),
            output: "\na.rs:2:5: 2:6 error: unexpected token: `+`\na.rs:2     +\n           ^\n",
        },
        Case {
            script: "cargo build",
            file: "src/lib.rs",
            line: 3,
            col: Some(5),
            output: "\n   Compiling test v0.1.0 (file:///tmp/fix-error/test)\n   src/lib.rs:3:5: 3:6 error: unexpected token: `+`\n   src/lib.rs:3     +\n                    ^\nCould not compile `test`.\n",
        },
        Case {
            script: "python a.py",
            file: "a.py",
            line: 2,
            col: None,
            output: "\n  File \"a.py\", line 2\n      +\n          ^\nSyntaxError: invalid syntax\n",
        },
        Case {
            script: "python café.py",
            file: "café.py",
            line: 8,
            col: None,
            output: "\nTraceback (most recent call last):\n  File \"café.py\", line 8, in <module>\n    match(\"foo\")\n  File \"café.py\", line 5, in match\n    m = re.search(None, command)\n",
        },
        Case {
            script: "ruby a.rb",
            file: "a.rb",
            line: 3,
            col: None,
            output: "\na.rb:3: syntax error, unexpected keyword_end\n",
        },
        Case {
            script: "lua a.lua",
            file: "a.lua",
            line: 2,
            col: None,
            output: "\nlua: a.lua:2: unexpected symbol near '+'\n",
        },
        Case {
            script: "fish a.sh",
            file: "/tmp/fix-error/a.sh",
            line: 2,
            col: None,
            output: "\nfish: Unknown command 'foo'\n/tmp/fix-error/a.sh (line 2): foo\n                              ^\n",
        },
        Case {
            script: "./a",
            file: "./a",
            line: 2,
            col: None,
            output: "\nawk: ./a:2: BEGIN { print \"Hello, world!\" + }\nawk: ./a:2:                                 ^ syntax error\n",
        },
        Case {
            script: "llc a.ll",
            file: "a.ll",
            line: 1,
            col: Some(2),
            output: "\nllc: a.ll:1:2: error: expected top-level entity\n+\n^\n",
        },
        Case {
            script: "go build a.go",
            file: "a.go",
            line: 1,
            col: Some(2),
            output: "\ncan't load package:\na.go:1:2: expected 'package', found '+'\n",
        },
        Case {
            script: "make",
            file: "Makefile",
            line: 2,
            col: None,
            output: "\nbidule\nmake: bidule: Command not found\nMakefile:2: recipe for target 'target' failed\nmake: *** [target] Error 127\n",
        },
        Case {
            script: "git st",
            file: "/home/martin/.config/git/config",
            line: 1,
            col: None,
            output: "\nfatal: bad config file line 1 in /home/martin/.config/git/config\n",
        },
        Case {
            script: "node heck.js asdf qwer",
            file: "/Users/pablo/Workspace/barebones/heck.js",
            line: 2,
            col: Some(5),
            output: "\n/Users/pablo/Workspace/barebones/heck.js:2\nconole.log(arg);\n^\nReferenceError: conole is not defined\n    at /Users/pablo/Workspace/barebones/heck.js:2:5\n    at Array.forEach (native)\n",
        },
        Case {
            script: "pep8",
            file: "./tests/rules/test_systemctl.py",
            line: 17,
            col: Some(80),
            output: "\n./tests/rules/test_systemctl.py:17:80: E501 line too long (93 > 79 characters)\n./tests/rules/test_whois.py:20:80: E501 line too long (89 > 79 characters)\n",
        },
    ];

    fn rule(system: MockSystem, fix_col_cmd: Option<&str>) -> FixFile {
        FixFile::new(
            Arc::new(system),
            "{editor} {file} +{line}".to_string(),
            fix_col_cmd.map(str::to_string),
        )
    }

    fn editor_host() -> MockSystem {
        MockSystem {
            all_files_exist: true,
            ..MockSystem::default()
        }
        .with_env("EDITOR", "dummy_editor")
    }

    #[test]
    fn test_match() {
        let rule = rule(editor_host(), None);
        for case in CASES {
            assert!(rule.is_match(&Command::new("", case.output)).unwrap(), "{}", case.script);
        }
    }

    #[test]
    fn test_no_editor() {
        let rule = rule(MockSystem { all_files_exist: true, ..MockSystem::default() }, None);
        for case in CASES {
            assert!(!rule.is_match(&Command::new("", case.output)).unwrap(), "{}", case.script);
        }
    }

    #[test]
    fn test_not_file() {
        let rule = rule(MockSystem::default().with_env("EDITOR", "dummy_editor"), None);
        for case in CASES {
            assert!(!rule.is_match(&Command::new("", case.output)).unwrap(), "{}", case.script);
        }
    }

    #[test]
    fn test_get_new_command_uses_line_only_by_default() {
        let rule = rule(editor_host(), None);
        for case in CASES {
            let command = Command::new(case.script, case.output);
            let expected = format!("dummy_editor {} +{} && {}", case.file, case.line, case.script);
            assert_eq!(
                rule.get_new_command(&command).unwrap(),
                NewCommand::Single(expected),
                "{}",
                case.script
            );
        }
    }

    #[test]
    fn test_get_new_command_with_column_template() {
        let rule = rule(editor_host(), Some("{editor} {file} +{line}:{col}"));
        for case in CASES {
            let command = Command::new(case.script, case.output);
            let expected = match case.col {
                Some(col) => format!("dummy_editor {} +{}:{} && {}", case.file, case.line, col, case.script),
                None => format!("dummy_editor {} +{} && {}", case.file, case.line, case.script),
            };
            assert_eq!(
                rule.get_new_command(&command).unwrap(),
                NewCommand::Single(expected),
                "{}",
                case.script
            );
        }
    }

    #[test]
    fn test_skips_locations_of_missing_files() {
        // Only the second reported file exists, so the python pattern loses to perl's
        let system = MockSystem::default()
            .with_env("EDITOR", "vim")
            .with_file("b.pl");
        let rule = rule(system, None);
        let command = Command::new(
            "perl b.pl",
            "  File \"a.py\", line 2\nsyntax error at b.pl line 7, at EOF\n",
        );

        assert!(rule.is_match(&command).unwrap());
        assert_eq!(
            rule.get_new_command(&command).unwrap(),
            NewCommand::Single("vim b.pl +7 && perl b.pl".to_string())
        );
    }
}
