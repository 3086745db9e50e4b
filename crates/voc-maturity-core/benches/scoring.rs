use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use voc_maturity_core::flow::{Action, Session};
use voc_maturity_core::model::{
    AnswerOption, AnswerSet, FlowPolicy, Question, Questionnaire, ResultTier, TierRange,
};
use voc_maturity_core::scoring::{compute_score, resolve_tier, score_answers, ScoreTable};

fn make_questionnaire(n: usize) -> Questionnaire {
    let options: Vec<AnswerOption> = ["yes", "unsure", "no"]
        .iter()
        .map(|key| AnswerOption {
            id: (*key).into(),
            key: Some((*key).into()),
            text: (*key).into(),
        })
        .collect();
    Questionnaire {
        id: "bench".into(),
        title: "Benchmark".into(),
        description: String::new(),
        instructions: vec![],
        questions: (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                title: format!("Question {i}"),
                options: options.clone(),
            })
            .collect(),
        tiers: (0..5)
            .map(|level| ResultTier {
                range: TierRange::new(
                    level as f64 * n as f64 / 5.0,
                    if level == 4 {
                        n as f64 + 0.5
                    } else {
                        (level + 1) as f64 * n as f64 / 5.0
                    },
                ),
                level: (level + 1).to_string(),
                name: format!("Level {}", level + 1),
                icon: String::new(),
                description: String::new(),
            })
            .collect(),
        weights: ScoreTable::default(),
        policy: FlowPolicy::default(),
    }
}

fn mixed_answers(n: usize) -> AnswerSet {
    AnswerSet::from_slots((0..n).map(|i| match i % 4 {
        0 => Some("yes"),
        1 => Some("unsure"),
        2 => Some("no"),
        _ => None,
    }))
}

fn bench_compute_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_score");
    let table = ScoreTable::default();

    for n in [10, 100, 1000] {
        let answers = mixed_answers(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| compute_score(black_box(&answers), black_box(&table)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let questionnaire = make_questionnaire(10);
    let answers = mixed_answers(10);

    group.bench_function("resolve_tier", |b| {
        b.iter(|| resolve_tier(black_box(6.5), black_box(&questionnaire.tiers)))
    });

    group.bench_function("score_answers", |b| {
        b.iter(|| score_answers(black_box(&questionnaire), black_box(&answers)))
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let questionnaire = Arc::new(make_questionnaire(10));

    c.bench_function("session_full_flow", |b| {
        b.iter(|| {
            let mut session = Session::new(Arc::clone(&questionnaire));
            session.apply(Action::Start).unwrap();
            session.apply(Action::Begin).unwrap();
            for _ in 0..10 {
                session.apply(Action::SelectOption("yes".into())).unwrap();
            }
            session.apply(Action::Compute).unwrap();
            black_box(session.outcome().map(|o| o.score))
        })
    });
}

criterion_group!(benches, bench_compute_score, bench_resolve, bench_session);
criterion_main!(benches);
