//! Import-block editing for `INSERT_IMPORT`.

use std::sync::LazyLock;

use regex::Regex;

static IMPORT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*import[\s{*'\x22]").expect("valid regex"));
static REQUIRE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(const|let|var)\s+.+=\s*require\(").expect("valid regex")
});
static STATEMENT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(from\s*['"][^'"]*['"]|^\s*import\s*['"][^'"]*['"])\s*;?\s*$"#).expect("valid regex"));

/// Whether `content` already carries `statement` on a line of its own.
pub fn has_import(content: &str, statement: &str) -> bool {
    content.lines().any(|line| line.trim() == statement.trim())
}

/// Inserts `statement` after the leading import block of `content`.
///
/// The leading block may contain blank lines, `//` comments, multi-line
/// `import { ... } from` statements and `require` declarations. With no
/// imports the statement goes to the very top. The file keeps its line
/// endings (`\r\n` or `\n`). Returns `None` when the statement is already
/// present.
pub fn insert_import(content: &str, statement: &str) -> Option<String> {
    if has_import(content, statement) {
        return None;
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut insert_at = 0;
    let mut in_statement = false;

    for (idx, line) in lines.iter().enumerate() {
        if in_statement {
            if STATEMENT_END.is_match(line) {
                in_statement = false;
                insert_at = idx + 1;
            }
            continue;
        }

        let trimmed = line.trim();
        if IMPORT_START.is_match(line) {
            if STATEMENT_END.is_match(line) {
                insert_at = idx + 1;
            } else {
                in_statement = true;
            }
        } else if REQUIRE_LINE.is_match(line) {
            insert_at = idx + 1;
        } else if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        } else {
            break;
        }
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    out.extend_from_slice(&lines[..insert_at]);
    out.push(statement);
    out.extend_from_slice(&lines[insert_at..]);

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut result = out.join(newline);
    if content.ends_with('\n') || content.is_empty() {
        result.push_str(newline);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINIA: &str = "import { createPinia } from \"pinia\";";

    #[test]
    fn test_inserts_after_last_import() {
        let src = "import { createApp } from \"vue\";\nimport App from \"./App.vue\";\n\ncreateApp(App).mount(\"#app\");\n";
        let out = insert_import(src, PINIA).unwrap();
        assert_eq!(
            out,
            "import { createApp } from \"vue\";\nimport App from \"./App.vue\";\nimport { createPinia } from \"pinia\";\n\ncreateApp(App).mount(\"#app\");\n"
        );
    }

    #[test]
    fn test_inserts_at_top_without_imports() {
        let out = insert_import("console.log(1);\n", PINIA).unwrap();
        assert_eq!(out, format!("{PINIA}\nconsole.log(1);\n"));
    }

    #[test]
    fn test_skips_multiline_import() {
        let src = "import {\n  a,\n  b,\n} from \"lib\";\nimport \"./style.css\";\nrun();\n";
        let out = insert_import(src, PINIA).unwrap();
        assert_eq!(
            out,
            format!("import {{\n  a,\n  b,\n}} from \"lib\";\nimport \"./style.css\";\n{PINIA}\nrun();\n")
        );
    }

    #[test]
    fn test_require_lines_count_as_imports() {
        let src = "// entry\nconst path = require(\"path\");\n\nmodule.exports = {};\n";
        let out = insert_import(src, PINIA).unwrap();
        assert_eq!(
            out,
            format!("// entry\nconst path = require(\"path\");\n{PINIA}\n\nmodule.exports = {{}};\n")
        );
    }

    #[test]
    fn test_keeps_crlf_line_endings() {
        let src = "import a from \"a\";\r\nrun();\r\n";
        let out = insert_import(src, PINIA).unwrap();
        assert_eq!(out, format!("import a from \"a\";\r\n{PINIA}\r\nrun();\r\n"));
    }

    #[test]
    fn test_duplicate_is_suppressed() {
        let src = format!("{PINIA}\nrun();\n");
        assert!(insert_import(&src, PINIA).is_none());
    }
}
