//! Promotion email rendering.

use crate::domain::projects::records::ProjectRecord;

const DEFAULT_NICKNAME: &str = "there";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Renders promotion emails with links rooted at the public site.
#[derive(Debug, Clone)]
pub struct PromotionRenderer {
    base_url: String,
}

impl PromotionRenderer {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn project_url(&self, project: &ProjectRecord) -> String {
        format!("{}/project/{}", self.base_url, project.uuid)
    }

    #[must_use]
    pub fn unsubscribe_url(&self, token: &str) -> String {
        format!("{}/api/email/unsubscribe?token={token}", self.base_url)
    }

    #[must_use]
    pub fn render(
        &self,
        project: &ProjectRecord,
        nickname: &str,
        unsubscribe_token: &str,
    ) -> RenderedEmail {
        let nickname = match nickname.trim() {
            "" => DEFAULT_NICKNAME,
            trimmed => trimmed,
        };

        let mut html = String::with_capacity(1024);

        html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"></head>\n<body>\n");

        html.push_str(&format!("<p>Hi {},</p>\n", escape_html(nickname)));
        html.push_str("<p>We found a project that might interest you.</p>\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&project.name)));

        if !project.description.trim().is_empty() {
            html.push_str(&format!("<p>{}</p>\n", escape_html(&project.description)));
        }

        html.push_str(&format!(
            "<p><a href=\"{}\">View the project</a></p>\n",
            escape_html(&self.project_url(project))
        ));
        html.push_str(&format!(
            "<p style=\"font-size:12px;color:#999\">Don't want these emails? <a href=\"{}\">Unsubscribe</a></p>\n",
            escape_html(&self.unsubscribe_url(unsubscribe_token))
        ));

        html.push_str("</body>\n</html>\n");

        RenderedEmail {
            subject: format!("A project you might like: {}", project.name),
            html,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }

    escaped
}
