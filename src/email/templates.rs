use std::collections::HashMap;

use handlebars::Handlebars;

use crate::infrastructure::NotifyError;

/// 邮件模板引擎
///
/// 所有模板在构造时注册；渲染对同一输入是确定性的，失败不重试。
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        for (name, source) in default_templates() {
            // 内置模板语法固定，注册失败属于程序缺陷
            handlebars
                .register_template_string(name, source)
                .unwrap_or_else(|e| panic!("builtin template '{name}' is invalid: {e}"));
        }

        Self { handlebars }
    }

    /// 渲染模板为 HTML 正文
    pub fn render(
        &self,
        template_id: &str,
        data: &HashMap<String, serde_json::Value>,
    ) -> Result<String, NotifyError> {
        if self.handlebars.get_template(template_id).is_none() {
            return Err(NotifyError::render(template_id, "unknown template"));
        }

        self.handlebars
            .render(template_id, data)
            .map_err(|e| NotifyError::render(template_id, e.to_string()))
    }

    /// 已注册的模板标识
    pub fn template_ids(&self) -> Vec<String> {
        self.handlebars.get_templates().keys().cloned().collect()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn default_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "welcome-email",
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .header { background-color: #2196F3; color: white; padding: 20px; border-radius: 5px 5px 0 0; }
        .content { padding: 20px; border: 1px solid #ddd; border-top: none; }
    </style>
</head>
<body>
    <div class="header"><h1>Welcome, {{userName}}!</h1></div>
    <div class="content">
        <p>Your {{appName}} account is ready.</p>
        {{#if loginUrl}}<p><a href="{{loginUrl}}">Sign in</a> to get started.</p>{{/if}}
    </div>
</body>
</html>"#,
        ),
        (
            "password-reset-email",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Password Reset</h1>
    <p>Hi {{userName}},</p>
    <p>We received a request to reset your {{appName}} password.</p>
    <p><a href="{{resetUrl}}">Reset your password</a></p>
    {{#if expiresInMinutes}}<p>This link expires in {{expiresInMinutes}} minutes.</p>{{/if}}
    <p>If you did not request this, you can safely ignore this email.</p>
</body>
</html>"#,
        ),
        (
            "email-verification",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Verify Your Email</h1>
    <p>Hi {{userName}},</p>
    <p>Confirm this address to finish setting up your {{appName}} account.</p>
    <p><a href="{{verificationUrl}}">Verify email address</a></p>
    {{#if verificationCode}}<p>Or enter this code: <strong>{{verificationCode}}</strong></p>{{/if}}
</body>
</html>"#,
        ),
        (
            "web-search-completed-email",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Your Search Results Are Ready</h1>
    <p>Hi {{userName}},</p>
    <p>The web search for <strong>{{query}}</strong> has finished.</p>
    {{#if resultCount}}<p>{{resultCount}} papers were found.</p>{{/if}}
    <p><a href="{{resultsUrl}}">View the results</a></p>
</body>
</html>"#,
        ),
        (
            "summarization-completed-email",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Your Summary Is Ready</h1>
    <p>Hi {{userName}},</p>
    <p>The summary for <strong>{{paperTitle}}</strong> is ready to read.</p>
    <p><a href="{{summaryUrl}}">Open the summary</a></p>
</body>
</html>"#,
        ),
        (
            "gap-analysis-completed-email",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Gap Analysis Complete</h1>
    <p>Hi {{userName}},</p>
    <p>The gap analysis for project <strong>{{projectName}}</strong> has completed.</p>
    {{#if gapCount}}<p>{{gapCount}} research gaps were identified.</p>{{/if}}
    <p><a href="{{analysisUrl}}">View the analysis</a></p>
</body>
</html>"#,
        ),
        (
            "project-deleted-email",
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body>
    <h1>Project Deleted</h1>
    <p>Hi {{userName}},</p>
    <p>The project <strong>{{projectName}}</strong> was deleted from your {{appName}} workspace.</p>
    {{#if deletedBy}}<p>Deleted by: {{deletedBy}}</p>{{/if}}
</body>
</html>"#,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_builtin_templates_registered() {
        let engine = TemplateEngine::new();
        for id in [
            "welcome-email",
            "password-reset-email",
            "email-verification",
            "web-search-completed-email",
            "summarization-completed-email",
            "gap-analysis-completed-email",
            "project-deleted-email",
        ] {
            assert!(engine.template_ids().contains(&id.to_string()), "{id}");
        }
    }

    #[test]
    fn test_render_welcome_email() {
        let engine = TemplateEngine::new();
        let html = engine
            .render(
                "welcome-email",
                &data(&[
                    ("userName", serde_json::json!("Ada")),
                    ("appName", serde_json::json!("ScholarAI")),
                    ("loginUrl", serde_json::json!("https://app.example/login")),
                ]),
            )
            .unwrap();

        assert!(html.contains("Welcome, Ada!"));
        assert!(html.contains("https://app.example/login"));
    }

    #[test]
    fn test_conditional_block_omitted_without_data() {
        let engine = TemplateEngine::new();
        let html = engine
            .render(
                "password-reset-email",
                &data(&[
                    ("userName", serde_json::json!("Ada")),
                    ("resetUrl", serde_json::json!("https://app.example/reset")),
                ]),
            )
            .unwrap();

        assert!(html.contains("https://app.example/reset"));
        assert!(!html.contains("expires in"));
    }

    #[test]
    fn test_unknown_template_is_render_error() {
        let engine = TemplateEngine::new();
        let err = engine.render("no-such-template", &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::Render { ref template, .. } if template == "no-such-template"
        ));
    }
}
