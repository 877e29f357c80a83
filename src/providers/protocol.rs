/*!
 * The line-marker protocol shared by all providers.
 *
 * Every batch is rendered as one prompt in which each subtitle line is
 * prefixed with `LINE_N:` where N is the line's stable identifier. The
 * response is parsed back by scanning for the same markers, so a reply
 * that drops or reorders lines still yields whatever it did contain.
 */

use std::collections::HashMap;

use crate::providers::TranslationRequest;

/// Marker prefix carried on every line in both directions
pub const LINE_PREFIX: &str = "LINE_";

/// Render the system prompt from its configured template
///
/// The template may reference `{source_language}` and `{target_language}`.
pub fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    let rendered = template
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language);

    format!(
        "{} Each subtitle line is prefixed with LINE_N: where N is the line identifier. \
        You MUST preserve these markers and translate EACH line separately, keeping the \
        exact same format. NEVER merge content between lines.",
        rendered
    )
}

/// Render the user prompt for one batch of lines
pub fn render_batch_prompt(request: &TranslationRequest) -> String {
    let mut prompt = format!(
        "Translate the following {} subtitle lines from {} to {}. Each line is prefixed \
        with LINE_N: where N is the line identifier.\n\n\
        IMPORTANT RULES:\n\
        - Return every line with its original LINE_N: prefix\n\
        - NEVER merge content between lines\n\
        - Translate each line individually\n\
        - Preserve formatting tags exactly as they appear\n\
        - Do not add commentary before or after the lines\n",
        request.lines.len(),
        request.source_language,
        request.target_language,
    );

    if !request.glossary.is_empty() {
        prompt.push_str("\nTERMINOLOGY (use these translations verbatim):\n");
        for term in &request.glossary {
            prompt.push_str(&format!("- \"{}\" -> \"{}\"\n", term.source, term.target));
        }
    }

    if let Some(context) = &request.context {
        if !context.trim().is_empty() {
            prompt.push_str(&format!("\nPROGRAM CONTEXT:\n{}\n", context.trim()));
        }
    }

    if !request.previous_lines.is_empty() {
        prompt.push_str(
            "\nPRECEDING DIALOGUE (already translated, shown for continuity; do not return these):\n",
        );
        for line in &request.previous_lines {
            match &line.translated_text {
                Some(translated) => {
                    prompt.push_str(&format!("- {} => {}\n", line.source_text, translated));
                }
                None => {
                    prompt.push_str(&format!("- {}\n", line.source_text));
                }
            }
        }
    }

    let capped: Vec<_> = request
        .lines
        .iter()
        .filter_map(|line| line.max_chars.map(|cap| (line.id, cap)))
        .collect();
    if !capped.is_empty() {
        prompt.push_str("\nLENGTH LIMITS (screen time is fixed; keep these translations within their limits):\n");
        for (id, cap) in capped {
            prompt.push_str(&format!("- LINE_{}: at most {} characters\n", id, cap));
        }
    }

    prompt.push_str("\nHere are the subtitle lines to translate:\n\n");
    for line in &request.lines {
        prompt.push_str(&format!("LINE_{}: {}\n", line.id, line.text));
    }

    prompt
}

/// Parse a provider response back into translations keyed by line id
///
/// Text on the marker line after the colon belongs to that line, as do any
/// following lines up to the next marker. Lines before the first marker are
/// discarded, and ids that resolve to empty text are dropped.
pub fn parse_batch_response(response: &str) -> HashMap<usize, String> {
    let mut resolved = HashMap::new();
    let mut current_id: Option<usize> = None;
    let mut current_text = String::new();

    let mut finalize =
        |id: Option<usize>, text: &mut String, resolved: &mut HashMap<usize, String>| {
            if let Some(id) = id {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    resolved.insert(id, trimmed.to_string());
                }
            }
            text.clear();
        };

    for raw_line in response.lines() {
        let line = raw_line.trim();

        if let Some(marker) = line.strip_prefix(LINE_PREFIX) {
            if let Some(colon_pos) = marker.find(':') {
                if let Ok(id) = marker[..colon_pos].parse::<usize>() {
                    finalize(current_id, &mut current_text, &mut resolved);
                    current_id = Some(id);

                    let remainder = marker[colon_pos + 1..].trim();
                    if !remainder.is_empty() {
                        current_text.push_str(remainder);
                    }
                    continue;
                }
            }
        }

        // Continuation of the current line's translation
        if current_id.is_some() && !line.is_empty() {
            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(line);
        }
    }

    finalize(current_id, &mut current_text, &mut resolved);
    resolved
}
