pub mod alias_prompt;
pub mod extraction_prompt;
pub mod llm_integration;
pub mod response;
