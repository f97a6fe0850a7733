use async_trait::async_trait;
use html_escape::encode_double_quoted_attribute;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use walletdock_domain::checkout::{FormSubmitter, FormTarget, RedirectForm, SubmittedForm};
use walletdock_domain::shared::DomainError;

/// Safari blocks `target="_blank"` submissions that are not user-initiated,
/// so it gets a same-tab submission.
pub fn detect_form_target(user_agent: &str) -> FormTarget {
    let is_safari = user_agent.contains("Safari") && !user_agent.contains("Chrome");
    if is_safari {
        FormTarget::SameContext
    } else {
        FormTarget::NewContext
    }
}

/// Self-submitting page with one hidden input per field
pub fn render_form_html(form: &RedirectForm, target: FormTarget) -> String {
    let target_attr = match target {
        FormTarget::NewContext => " target=\"_blank\"",
        FormTarget::SameContext => "",
    };

    let inputs: String = form
        .fields
        .iter()
        .map(|(name, value)| {
            format!(
                "    <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                encode_double_quoted_attribute(name),
                encode_double_quoted_attribute(value)
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Redirecting to payment</title></head>\n<body>\n  <form id=\"pay\" method=\"POST\" action=\"{}\"{}>\n{}  </form>\n  <script>document.getElementById('pay').submit();</script>\n</body>\n</html>\n",
        encode_double_quoted_attribute(&form.action),
        target_attr,
        inputs
    )
}

/// Writes the redirect form to an HTML file for the user's browser to open
pub struct HtmlFormSubmitter {
    dir: PathBuf,
    target: FormTarget,
}

impl HtmlFormSubmitter {
    pub fn new(dir: impl Into<PathBuf>, user_agent: &str) -> Self {
        Self {
            dir: dir.into(),
            target: detect_form_target(user_agent),
        }
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }
}

#[async_trait]
impl FormSubmitter for HtmlFormSubmitter {
    async fn submit(&self, form: &RedirectForm) -> Result<SubmittedForm, DomainError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Configuration(format!("Checkout dir: {}", e)))?;

        let path = self.dir.join(format!("checkout-{}.html", Uuid::new_v4()));
        let html = render_form_html(form, self.target);
        tokio::fs::write(&path, html)
            .await
            .map_err(|e| DomainError::Configuration(format!("Failed to write checkout page: {}", e)))?;

        info!(
            "Checkout form for {} written to {:?} ({} fields)",
            form.action,
            path,
            form.fields.len()
        );

        Ok(SubmittedForm {
            target: self.target,
            location: Some(path.display().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const CHROME_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";
    const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15";

    fn form() -> RedirectForm {
        let mut fields = BTreeMap::new();
        fields.insert("money".to_string(), "10.00".to_string());
        fields.insert("name".to_string(), "TUC<5>".to_string());
        fields.insert("sign".to_string(), "a\"b".to_string());
        RedirectForm::new("https://pay.example.com/submit.php?a=1&b=2", fields)
    }

    #[test]
    fn test_detect_form_target() {
        assert_eq!(detect_form_target(CHROME_UA), FormTarget::NewContext);
        assert_eq!(detect_form_target(SAFARI_UA), FormTarget::SameContext);
        assert_eq!(detect_form_target("curl/8.0"), FormTarget::NewContext);
    }

    #[test]
    fn test_render_form_html_escapes_and_targets() {
        let html = render_form_html(&form(), FormTarget::NewContext);
        assert!(html.contains("action=\"https://pay.example.com/submit.php?a=1&amp;b=2\" target=\"_blank\""));
        assert!(html.contains("name=\"name\" value=\"TUC&lt;5&gt;\""));
        assert!(html.contains("name=\"money\" value=\"10.00\""));
        assert!(html.contains("name=\"sign\" value=\"a&quot;b\""));

        let same_tab = render_form_html(&form(), FormTarget::SameContext);
        assert!(!same_tab.contains("_blank"));
    }

    #[tokio::test]
    async fn test_submit_writes_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = HtmlFormSubmitter::new(dir.path().join("checkout"), SAFARI_UA);

        let submitted = submitter.submit(&form()).await.unwrap();
        assert_eq!(submitted.target, FormTarget::SameContext);

        let path = submitted.location.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("method=\"POST\""));
        assert!(content.contains("submit()"));
    }
}
