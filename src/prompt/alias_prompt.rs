/// Build a prompt asking the model to group names that denote the same entity
pub fn build_alias_prompt(names: &[String]) -> String {
    let listing = names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are cleaning up entity names in a noisy knowledge graph.

Here is a list of entity names:
{}

Identify and group names that clearly refer to the same real-world entity. Only group names if you are absolutely confident they refer to the exact same thing, not merely similar or related entities.

Rules:
- Only include groups where multiple names refer to the same exact entity.
- Pick the most complete, common, or widely accepted name as the canonical name.
- Do not output singleton entities (names with no matching variants).
- Do not group entities that differ in meaning even if their wording is similar (e.g. "male rats" vs "female rats", or "Amazon" vs "Amazon River").
- A name may appear in at most one group.

Example:
Names "Albert Einstein", "A. Einstein", "Al. Einstein" become
[{{"canonical": "Albert Einstein", "aliases": ["A. Einstein", "Al. Einstein"]}}]

Format your response as a JSON array:
[{{"canonical": "<name>", "aliases": ["<variant1>", "<variant2>"]}}]

Only provide the JSON with no other text."#,
        listing
    )
}
