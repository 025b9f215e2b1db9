//! Instruction templates for LLM-based receipt parsing.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the field schema the model is asked to
//!    emit (`total`, `business`, `items`, `transaction_timestamp`) appears in
//!    exactly one place. Downstream code and tests reference the same names.
//!
//! 2. **Testability** — unit tests can inspect the template directly without
//!    a live model, so an accidental field rename is caught immediately.
//!
//! Callers can override the template via
//! [`crate::config::ScanConfig::prompt_template`]; the constant here is used
//! only when no override is provided. The field names and the integer-cents
//! rule are part of the pipeline's contract and must survive any override the
//! caller writes.

/// Default instruction template for parsing OCR text into a receipt record.
///
/// The raw OCR text is appended directly after this template by
/// [`build_prompt`]. This prompt is used when
/// `ScanConfig::prompt_template` is `None`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a receipt parser. You are given the raw OCR text of a store receipt.

Follow these rules precisely:

1. OUTPUT SHAPE
   Return a single JSON object with exactly these fields:
   {"total", "business", "items": [{"title", "quantity", "price"}], "transaction_timestamp"}

2. PRICES
   Return "total" and every item "price" as integers counting cents
   (1.00 in any currency = 100 cents). Never use decimal points.

3. ITEMS
   List items in the order they appear on the receipt. If no line items
   are legible, return an empty "items" array.

4. TIMESTAMP
   Put the purchase date and time in "transaction_timestamp" as printed
   on the receipt, or an empty string if none is visible.

5. OUTPUT FORMAT
   Return ONLY the JSON object. Do not add commentary, code fences, or
   anything else before or after it.

Here is the text extracted from the receipt: "#;

/// Concatenate the instruction template with the raw OCR text.
///
/// The raw text is appended verbatim — even when empty, the result is a
/// well-formed prompt (the instruction block stands on its own).
pub fn build_prompt(template: &str, raw_text: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + raw_text.len());
    prompt.push_str(template);
    prompt.push_str(raw_text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_every_contract_field() {
        for field in ["total", "business", "items", "transaction_timestamp"] {
            assert!(
                DEFAULT_PROMPT_TEMPLATE.contains(&format!("\"{field}\"")),
                "template is missing field {field:?}"
            );
        }
        for item_field in ["title", "quantity", "price"] {
            assert!(DEFAULT_PROMPT_TEMPLATE.contains(&format!("\"{item_field}\"")));
        }
    }

    #[test]
    fn template_states_cents_rule() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("cents"));
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("100 cents"));
    }

    #[test]
    fn build_prompt_appends_raw_text() {
        let prompt = build_prompt(DEFAULT_PROMPT_TEMPLATE, "MILK 2.49\nTOTAL 2.49");
        assert!(prompt.starts_with(DEFAULT_PROMPT_TEMPLATE));
        assert!(prompt.ends_with("TOTAL 2.49"));
    }

    #[test]
    fn build_prompt_with_empty_text_is_well_formed() {
        // Blank receipt image → empty OCR text → the prompt is just the
        // instruction block, still valid to send.
        let prompt = build_prompt(DEFAULT_PROMPT_TEMPLATE, "");
        assert_eq!(prompt, DEFAULT_PROMPT_TEMPLATE);
    }
}
