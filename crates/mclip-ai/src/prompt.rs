//! Prompt construction for AI scoring.

use mclip_models::timestamp::format_range;

use crate::types::ScoringBatch;

/// Criteria every provider is asked to score.
pub const CRITERIA: [&str; 4] = ["engagement", "topic_quality", "hook_strength", "standalone"];

pub const SYSTEM_PROMPT: &str = "You rate short video clip candidates for social media. \
You answer with a single JSON object and nothing else.";

/// Build the user prompt for a batch.
pub fn build_prompt(batch: &ScoringBatch) -> String {
    let mut candidates = String::new();
    for item in &batch.items {
        candidates.push_str(&format!(
            "Candidate {id} {range} ({duration:.1}s):\n{context}\n\n",
            id = item.id,
            range = format_range(item.start, item.end),
            duration = item.end - item.start,
            context = item.context.trim(),
        ));
    }

    format!(
        r#"Score each candidate clip below on a 0-10 scale for these criteria:
- engagement: would a viewer keep watching and share it?
- topic_quality: is there one clear, interesting topic?
- hook_strength: do the first seconds grab attention?
- standalone: does it make sense without the rest of the video?

Also give a composite_score from 0 to 10 summarising the clip.

Return ONLY a single JSON object with this schema:
{{
  "scores": [
    {{
      "id": 0,
      "composite_score": 7.5,
      "breakdown": {{"engagement": 8.0, "topic_quality": 7.0, "hook_strength": 7.5, "standalone": 7.0}}
    }}
  ]
}}

Include exactly one entry per candidate id.

CANDIDATES:
{candidates}"#
    )
}
