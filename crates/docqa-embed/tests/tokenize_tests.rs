use std::str::FromStr;

use candle_core::Device;
use docqa_embed::tokenize::{configure_truncation, tokenize_on_device};
use tokenizers::Tokenizer;

const CLS: u32 = 0;
const SEP: u32 = 1;

/// Word-level tokenizer with BERT-style `[CLS] ... [SEP]` framing.
fn bert_like_tokenizer() -> Tokenizer {
    let json = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": { "type": "BertProcessing", "sep": ["[SEP]", 1], "cls": ["[CLS]", 0] },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[CLS]": 0, "[SEP]": 1, "[UNK]": 2, "a": 3, "b": 4, "c": 5 },
            "unk_token": "[UNK]"
        }
    }"#;
    Tokenizer::from_str(json).unwrap()
}

#[test]
fn truncated_sequence_keeps_trailing_sep() {
    let mut tokenizer = bert_like_tokenizer();
    configure_truncation(&mut tokenizer, 4).unwrap();
    let (ids, mask, types) = tokenize_on_device(&tokenizer, "a b c a b c", &Device::Cpu).unwrap();

    let ids: Vec<Vec<u32>> = ids.to_vec2().unwrap();
    assert_eq!(ids, vec![vec![CLS, 3, 4, SEP]]);
    let mask: Vec<Vec<u32>> = mask.to_vec2().unwrap();
    assert_eq!(mask, vec![vec![1, 1, 1, 1]]);
    assert_eq!(types.dims(), &[1, 4]);
}

#[test]
fn short_sequence_is_untouched() {
    let mut tokenizer = bert_like_tokenizer();
    configure_truncation(&mut tokenizer, 16).unwrap();
    let (ids, _, _) = tokenize_on_device(&tokenizer, "c b", &Device::Cpu).unwrap();
    let ids: Vec<Vec<u32>> = ids.to_vec2().unwrap();
    assert_eq!(ids, vec![vec![CLS, 5, 4, SEP]]);
}
