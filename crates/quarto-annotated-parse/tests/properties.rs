/*
 * properties.rs
 * Copyright (c) 2025 Posit, PBC
 */

use proptest::prelude::*;
use quarto_annotated_parse::*;
use quarto_provenance::{FileId, FileRegistry, ProvenancePool, Resolver};
use serde_json::{Value, json};

/// A paragraph of words separated by single spaces, with each inline a
/// substring of the paragraph record.
fn paragraph(pool: &mut ProvenancePool, words: &[String], start: usize) -> Value {
    let len = words.iter().map(String::len).sum::<usize>() + words.len().saturating_sub(1);
    let para = pool.push_direct(FileId(0), start, start + len).unwrap();

    let mut inlines = Vec::new();
    let mut offset = 0;
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            let space = pool.push_substring(para, offset, offset + 1).unwrap();
            inlines.push(json!({"t": "Space", "s": space.0}));
            offset += 1;
        }
        let s = pool.push_substring(para, offset, offset + word.len()).unwrap();
        inlines.push(json!({"t": "Str", "c": word, "s": s.0}));
        offset += word.len();
    }
    json!({"t": "Para", "s": para.0, "c": inlines})
}

proptest! {
    #[test]
    fn inline_nodes_slice_their_words(words in prop::collection::vec("[a-zé]{1,6}", 1..12)) {
        let content = format!("{}\n", words.join(" "));
        let mut registry = FileRegistry::new();
        registry.add_file("doc.qmd", content.clone());
        let mut pool = ProvenancePool::new();
        let block = paragraph(&mut pool, &words, 0);

        let mut resolver = Resolver::new(&pool, &registry);
        let para = annotate_block(&block, &mut resolver).unwrap();

        prop_assert_eq!(para.text(), content.trim_end());
        for node in para.descendants() {
            prop_assert!(node.start <= node.end && node.end <= node.source.len());
        }
        let texts: Vec<&str> = para.find_all("Str").map(AnnotatedNode::text).collect();
        prop_assert_eq!(texts, words.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn list_items_round_trip(sizes in prop::collection::vec(0usize..4, 1..6)) {
        let mut content = String::new();
        let mut pool = ProvenancePool::new();
        let mut items = Vec::new();
        for (i, &size) in sizes.iter().enumerate() {
            let mut item = Vec::new();
            for j in 0..size {
                let word = format!("w{}x{}", i, j);
                item.push(paragraph(&mut pool, &[word.clone()], content.len()));
                content.push_str(&word);
                content.push('\n');
            }
            items.push(Value::Array(item));
        }
        let list = pool.push_direct(FileId(0), 0, content.len()).unwrap();
        let block = json!({"t": "BulletList", "s": list.0, "c": items});

        let mut registry = FileRegistry::new();
        registry.add_file("doc.qmd", content);
        let mut resolver = Resolver::new(&pool, &registry);
        let node = annotate_block(&block, &mut resolver).unwrap();

        let groups = navigate_list_items(&node).unwrap();
        prop_assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), sizes.clone());
        for (i, group) in groups.iter().enumerate() {
            for (j, para) in group.iter().enumerate() {
                prop_assert_eq!(para.text(), format!("w{}x{}", i, j));
            }
        }
        prop_assert_eq!(flatten_groups(&groups), node.components.clone());
    }
}

#[test]
fn substring_ids_are_shared_between_nodes() {
    // Two nodes may point at the same record; both resolve to the same span.
    let mut registry = FileRegistry::new();
    registry.add_file("doc.qmd", "word\n");
    let mut pool = ProvenancePool::new();
    let para = pool.push_direct(FileId(0), 0, 4).unwrap();
    let word = pool.push_substring(para, 0, 4).unwrap();
    assert_eq!(pool.push_substring(para, 0, 4).unwrap(), word);

    let block = json!({"t": "Plain", "s": word.0, "c": [{"t": "Str", "c": "word", "s": word.0}]});
    let mut resolver = Resolver::new(&pool, &registry);
    let plain = annotate_block(&block, &mut resolver).unwrap();
    assert_eq!(plain.text(), "word");
    assert_eq!(plain.components[0].text(), "word");
}
