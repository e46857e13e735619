//! Prompt templates for Vidlearn.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub article: ArticlePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for turning a transcript into a learning article.
///
/// Placeholders: `{{title}}` and `{{transcript}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticlePrompts {
    pub user: String,
}

impl Default for ArticlePrompts {
    fn default() -> Self {
        Self {
            user: r#"
You are an expert educational content creator. Transform the following transcript into a comprehensive, well-structured learning article.

**Original Video:** {{title}}

**Instructions:**
1. Create a professional learning article with clear sections
2. Elaborate on **all sections** in detail
3. Expand all concepts mentioned in the transcript with thorough explanations
4. Add context, examples, and applications for every topic
5. Structure the content logically for learning progression
6. Use markdown formatting with proper headings and subheadings
7. Ensure clarity and readability for educational purposes
8. Make the content engaging and practical

**Required Article Structure:**
# [Descriptive Title Based on Content]

## Executive Summary
Brief overview of what this article covers and key insights

## Learning Objectives
What readers will learn from this article (3-5 bullet points)

## Introduction
Context and background for the topic

## Core Concepts
### [Concept 1]
Detailed explanation with examples

### [Concept 2]
Detailed explanation with examples

[Continue for all major concepts]

## Detailed Analysis
Deep dive into the most important topics with:
- Explanations of techniques or methods
- Real-world applications
- Examples and scenarios

## Practical Applications
How to apply these concepts in real situations

## Key Takeaways
- Summarize the most important points (5-7 bullet points)
- Focus on actionable insights

## Conclusion
Wrap up the main themes and encourage further learning

---

**Transcript to Transform:**

{{transcript}}

**Generate the learning article now:**
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let article_path = custom_path.join("article.toml");
            if article_path.exists() {
                let content = std::fs::read_to_string(&article_path)?;
                prompts.article = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is single-pass: text inserted for one placeholder is never
    /// rescanned, so a transcript containing `{{title}}` stays literal.
    /// Unknown placeholders are left in place.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            match after.find("}}") {
                Some(close) => {
                    let key = &after[..close];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
