/// Build a prompt asking for subject-relation-object triples from one passage
pub fn build_extraction_prompt(passage: &str, context: &str) -> String {
    format!(
        r#"You are building a knowledge graph from text.

Context: {}

Passage:
"""
{}
"""

Extract every factual relation stated in the passage as a (subject, relation, object) triple.

Rules:
- Subjects and objects are entities or concepts named in the passage. Use the wording of the passage.
- Relations are short verb phrases (e.g. "causes", "is part of", "was discovered by").
- Do not invent facts that the passage does not state.
- If the passage states no relations, return an empty list.

Format your response as JSON with this structure:
{{"relations": [["<subject>", "<relation>", "<object>"], ...]}}

Only provide the JSON with no other text."#,
        context, passage
    )
}
