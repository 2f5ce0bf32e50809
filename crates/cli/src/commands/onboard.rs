//! `relaydesk onboard`: First-time setup.

use relaydesk_config::AppConfig;
use std::path::Path;

const STARTER_KB: &str = r#"{
  "brand": { "name": "Acme" },
  "faq": [
    {
      "q": "What are your opening hours?",
      "a": "We are open Monday to Friday, 9:00 to 17:00.",
      "url": "https://www.example.com/contact",
      "category": "General"
    }
  ]
}
"#;

const STARTER_DIRECTIVES: &str = r#"{
  "introduction": "You are the Acme support assistant.",
  "tone": "Friendly and professional",
  "style": "Short paragraphs, plain language",
  "max_response_length": "About 120 words",
  "link_policy": "Only share links that appear in the provided resources",
  "escalation_contact": "support@example.com"
}
"#;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("RelayDesk First-Time Setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let config = if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        AppConfig::load_from(&config_path).map_err(|e| format!("Failed to load config: {e}"))?
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        AppConfig::default()
    };

    // Starter documents only make sense for a local knowledge base
    if !config.knowledge.is_remote() {
        let base = Path::new(&config.knowledge.base);
        std::fs::create_dir_all(base)?;
        write_if_missing(&base.join(&config.knowledge.faq_path), STARTER_KB)?;
        write_if_missing(&base.join(&config.knowledge.directives_path), STARTER_DIRECTIVES)?;
    }

    println!("\n📝 Next steps:");
    println!("   1. Set RELAYDESK_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Import your FAQ: relaydesk ingest faq.csv");
    println!("   3. Run: relaydesk serve");
    println!("   4. Chat: relaydesk chat\n");

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> std::io::Result<()> {
    if path.exists() {
        println!("  Keeping existing {}", path.display());
        return Ok(());
    }
    std::fs::write(path, contents)?;
    println!("✅ Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydesk_core::knowledge::{DirectivesDocument, KnowledgeDocument};

    #[test]
    fn starter_documents_parse() {
        let kb = KnowledgeDocument::from_json(STARTER_KB).unwrap();
        assert_eq!(kb.brand_name(), Some("Acme"));
        assert_eq!(kb.faq.len(), 1);

        let directives = DirectivesDocument::from_json(STARTER_DIRECTIVES).unwrap();
        assert!(directives.get("tone").is_some());
    }

    #[test]
    fn existing_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "mine").unwrap();
        write_if_missing(&path, STARTER_KB).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mine");

        let fresh = dir.path().join("directives.json");
        write_if_missing(&fresh, STARTER_DIRECTIVES).unwrap();
        assert_eq!(std::fs::read_to_string(&fresh).unwrap(), STARTER_DIRECTIVES);
    }
}
