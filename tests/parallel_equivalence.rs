//! Sequential and parallel execution paths must agree.
//!
//! Over a randomized corpus, the parallel retrieval, matching, and removal
//! paths are compared against their sequential twins. Relevance on the
//! parallel path accumulates per-document sums in scheduling order, so the
//! comparison allows last-ulp noise while requiring identical orderings.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use squill::{DocumentId, DocumentStatus, SearchEngine, SearchResult};

const VOCABULARY: [&str; 24] = [
    "cat", "dog", "bird", "rat", "horse", "city", "village", "harbor", "river", "meadow",
    "funny", "nasty", "curly", "white", "black", "tail", "collar", "eyes", "paws", "fur",
    "runs", "sleeps", "hunts", "plays",
];

const STATUSES: [DocumentStatus; 4] = [
    DocumentStatus::Actual,
    DocumentStatus::Irrelevant,
    DocumentStatus::Banned,
    DocumentStatus::Removed,
];

fn random_text(rng: &mut StdRng) -> String {
    let word_count = rng.gen_range(3..=12);
    let words: Vec<&str> = (0..word_count)
        .map(|_| *VOCABULARY.choose(rng).unwrap())
        .collect();
    words.join(" ")
}

fn random_query(rng: &mut StdRng) -> String {
    let term_count = rng.gen_range(1..=5);
    let terms: Vec<String> = (0..term_count)
        .map(|_| {
            let word = *VOCABULARY.choose(rng).unwrap();
            if rng.gen_bool(0.25) {
                format!("-{word}")
            } else {
                word.to_string()
            }
        })
        .collect();
    terms.join(" ")
}

fn build_corpus(rng: &mut StdRng, document_count: usize) -> Vec<(DocumentId, String, DocumentStatus, Vec<i32>)> {
    (0..document_count)
        .map(|id| {
            let text = random_text(rng);
            // bias towards Actual so the default predicate sees matches
            let status = if rng.gen_bool(0.7) {
                DocumentStatus::Actual
            } else {
                *STATUSES.choose(rng).unwrap()
            };
            let ratings: Vec<i32> = (0..rng.gen_range(0..=4))
                .map(|_| rng.gen_range(-20..=20))
                .collect();
            (id as DocumentId, text, status, ratings)
        })
        .collect()
}

fn populate(engine: &mut SearchEngine, corpus: &[(DocumentId, String, DocumentStatus, Vec<i32>)]) {
    for (id, text, status, ratings) in corpus {
        engine.add_document(*id, text, *status, ratings).unwrap();
    }
}

fn assert_results_agree(sequential: &[SearchResult], parallel: &[SearchResult], context: &str) {
    assert_eq!(
        sequential.len(),
        parallel.len(),
        "result count diverged for {context}"
    );
    for (seq, par) in sequential.iter().zip(parallel) {
        assert_eq!(seq.id, par.id, "ordering diverged for {context}");
        assert_eq!(seq.rating, par.rating, "rating diverged for {context}");
        assert!(
            (seq.relevance - par.relevance).abs() < 1e-9,
            "relevance diverged for {context}: {} vs {}",
            seq.relevance,
            par.relevance
        );
    }
}

#[test]
fn retrieval_paths_agree_on_random_corpus() {
    let mut rng = StdRng::seed_from_u64(20240817);
    let corpus = build_corpus(&mut rng, 400);
    let mut engine = SearchEngine::from_stop_words_text("in the and").unwrap();
    populate(&mut engine, &corpus);

    for _ in 0..300 {
        let raw_query = random_query(&mut rng);

        let sequential = engine.find_top_documents(&raw_query).unwrap();
        let parallel = engine.find_top_documents_par(&raw_query).unwrap();
        assert_results_agree(&sequential, &parallel, &raw_query);

        let sequential = engine
            .find_top_documents_with_status(&raw_query, DocumentStatus::Banned)
            .unwrap();
        let parallel = engine
            .find_top_documents_with_status_par(&raw_query, DocumentStatus::Banned)
            .unwrap();
        assert_results_agree(&sequential, &parallel, &raw_query);

        let predicate =
            |id: DocumentId, _: DocumentStatus, rating: i32| rating >= 0 && id % 3 != 0;
        let sequential = engine
            .find_top_documents_by(&raw_query, predicate)
            .unwrap();
        let parallel = engine
            .find_top_documents_by_par(&raw_query, predicate)
            .unwrap();
        assert_results_agree(&sequential, &parallel, &raw_query);
    }
}

#[test]
fn match_paths_agree_on_random_corpus() {
    let mut rng = StdRng::seed_from_u64(8250113);
    let corpus = build_corpus(&mut rng, 120);
    let mut engine = SearchEngine::from_stop_words_text("in the and").unwrap();
    populate(&mut engine, &corpus);

    for _ in 0..200 {
        let raw_query = random_query(&mut rng);
        let document_id = rng.gen_range(0..120);

        let sequential = engine.match_document(&raw_query, document_id).unwrap();
        let parallel = engine.match_document_par(&raw_query, document_id).unwrap();
        assert_eq!(sequential, parallel, "query {raw_query:?} doc {document_id}");
    }
}

#[test]
fn removal_paths_leave_identical_state() {
    let mut rng = StdRng::seed_from_u64(42);
    let corpus = build_corpus(&mut rng, 200);

    let mut sequential = SearchEngine::from_stop_words_text("in the and").unwrap();
    let mut parallel = SearchEngine::from_stop_words_text("in the and").unwrap();
    populate(&mut sequential, &corpus);
    populate(&mut parallel, &corpus);

    let mut doomed: Vec<DocumentId> = (0..200).collect();
    doomed.shuffle(&mut rng);
    doomed.truncate(100);
    for &document_id in &doomed {
        sequential.remove_document(document_id);
        parallel.remove_document_par(document_id);
    }

    assert_eq!(sequential.document_count(), parallel.document_count());
    let sequential_ids: Vec<DocumentId> = sequential.document_ids().collect();
    let parallel_ids: Vec<DocumentId> = parallel.document_ids().collect();
    assert_eq!(sequential_ids, parallel_ids);

    for document_id in 0..200 {
        assert_eq!(
            sequential.word_frequencies(document_id),
            parallel.word_frequencies(document_id),
            "forward entries diverged for {document_id}"
        );
    }

    // the surviving index still answers queries identically
    for _ in 0..50 {
        let raw_query = random_query(&mut rng);
        let seq_results = sequential.find_top_documents(&raw_query).unwrap();
        let par_results = parallel.find_top_documents(&raw_query).unwrap();
        assert_eq!(seq_results, par_results, "query {raw_query:?}");
    }
}
