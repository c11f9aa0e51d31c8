use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse key/value pairs from a `.env` file in the current working directory,
/// if present. Does not modify the process environment.
pub fn parse_env_file() -> Result<HashMap<String, String>> {
    let path = Path::new(".env");
    let mut map = HashMap::new();
    if !path.exists() {
        return Ok(map);
    }
    let content = fs::read_to_string(path)?;
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some(eq) = s.find('=') else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let key = s[..eq].trim();
        let mut val = s[eq + 1..].to_string();
        if (val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\''))
        {
            val = val[1..val.len() - 1].to_string();
        }
        map.insert(key.to_string(), val);
    }
    Ok(map)
}

/// Load `.env` into the process environment. Non-destructive: existing
/// variables are never overridden.
pub fn load_dotenv_if_present() -> Result<()> {
    for (k, v) in parse_env_file()? {
        if std::env::var_os(&k).is_none() {
            std::env::set_var(&k, &v);
        }
    }
    Ok(())
}

/// Generate a `.env.template` file with placeholder values and comments.
pub fn write_env_template(path: &str) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# catalog_matcher environment configuration template
# Copy this file to .env and fill in your CRM credentials.
# Any of these variables can also be provided via the system environment.

# CRM private-app bearer token (required)
CRM_ACCESS_TOKEN=secret

# CRM API base URL (required)
CRM_BASE_URL=https://api.crm.example.com/crm/v3

# Optional logging filter
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_required_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.template");
        write_env_template(path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("CRM_ACCESS_TOKEN"));
        assert!(text.contains("CRM_BASE_URL"));
    }
}
