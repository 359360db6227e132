/*!
 * Tests for chunk splitting and merging
 */

use reelingo::app_config::ChunkingConfig;
use reelingo::translation::{Chunk, TextChunker};

fn prose(target_chars: usize) -> String {
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < target_chars {
        text.push_str(&format!("The river carried boat {} past the old mill before dawn. ", i));
        if i % 9 == 8 {
            text.push_str("\n\n");
        }
        i += 1;
    }
    text.chars().take(target_chars).collect()
}

#[test]
fn test_five_thousand_chars_should_split_into_at_least_four_chunks() {
    let chunker = TextChunker::from_config(&ChunkingConfig::default());
    let text = prose(5000);
    let chunks = chunker.split(&text);

    assert!(chunks.len() >= 4, "got {} chunks", chunks.len());
    assert!(chunks.iter().all(|c| c.char_len() <= 1500));
    assert!(chunks.iter().all(|c| c.overlap <= 200));
    assert_eq!(chunks[0].overlap, 0);
}

#[test]
fn test_short_text_should_pass_through_untouched() {
    let chunker = TextChunker::default();
    let text = "Hello world";
    assert!(!chunker.needs_split(text));

    let chunks = chunker.split(text);
    assert_eq!(chunks.len(), 1);
    let translated: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    assert_eq!(chunker.merge(&translated, 0.5), text);
}

#[test]
fn test_merged_identity_translation_should_stay_within_overlap_budget() {
    let chunker = TextChunker::default();
    let text = prose(5000);
    let chunks = chunker.split(&text);
    let translated: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    let merged = chunker.merge_chunks(&chunks, &translated, 0.5);
    let budget: usize = chunks.iter().map(|c| c.overlap).sum();
    let merged_len = merged.chars().count();
    assert!(merged_len >= 5000 - budget);
    assert!(merged_len <= 5000 + budget);
    assert!(merged.starts_with("The river carried boat 0"));
}

#[test]
fn test_fresh_text_should_rebuild_the_input() {
    let chunker = TextChunker::new(300, 60);
    let text = prose(2000);
    let rebuilt: String = chunker.split(&text).iter().map(Chunk::fresh_text).collect();
    assert_eq!(rebuilt, text);
}

#[test]
fn test_splitting_twice_should_give_the_same_chunks() {
    let chunker = TextChunker::new(400, 50);
    let text = prose(3000);
    assert_eq!(chunker.split(&text), chunker.split(&text));
}

#[test]
fn test_remerging_merged_output_should_not_drop_a_chunk() {
    let chunker = TextChunker::from_config(&ChunkingConfig::default());
    let text = prose(5006);
    let merge_identity = |input: &str| {
        let chunks = chunker.split(input);
        let translated: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        (chunker.merge(&translated, 0.5), chunks)
    };

    let (first, _) = merge_identity(&text);
    let (second, chunks) = merge_identity(&first);

    assert!(chunks.len() >= 4, "got {} chunks", chunks.len());
    let budget: usize = chunks.iter().map(|c| c.overlap).sum();
    let (first_len, second_len) = (first.chars().count(), second.chars().count());
    assert!(second_len + budget >= first_len && second_len <= first_len + budget);

    for chunk in &chunks {
        let tail: String = chunk.text.chars().rev().take(40).collect::<Vec<_>>().into_iter().rev().collect();
        assert!(second.contains(&tail), "chunk {} is missing from the re-merged text", chunk.index);
    }
}
