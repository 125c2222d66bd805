use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{thread_rng, Rng};
use std::collections::BTreeSet;

use meeting_room_booking::draft::{BookingDraft, DraftChange};
use meeting_room_booking::models::Consumption;
use meeting_room_booking::state::{reduce, FormEvent, FormState};
use meeting_room_booking::{DraftValidator, MasterData};

fn filled_draft(consumptions: usize) -> BookingDraft {
    BookingDraft {
        unit_id: Some(1),
        meeting_room_id: Some(12),
        meeting_date: Some("2025-03-10".to_string()),
        start_time: Some("09:00".to_string()),
        end_time: Some("10:30".to_string()),
        participant_count: Some(8),
        consumption_amount: Some(150_000),
        consumption_ids: (1..=consumptions as u64).collect::<BTreeSet<_>>(),
        notes: Some("Quarterly review".to_string()),
    }
}

fn validator_with(consumptions: usize) -> DraftValidator {
    let master = MasterData {
        units: vec![],
        rooms: vec![],
        consumptions: (1..=consumptions as u64)
            .map(|id| Consumption {
                id,
                name: format!("Option {}", id),
                is_active: true,
            })
            .collect(),
    };
    DraftValidator::with_master_data(&master)
}

pub fn validate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("draft_validation");

    for size in [0usize, 10, 100].iter() {
        let draft = filled_draft(*size);
        let validator = validator_with(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(validator.validate(black_box(&draft))))
        });
    }

    group.finish();
}

pub fn reduce_benchmark(c: &mut Criterion) {
    let validator = DraftValidator::new();

    c.bench_function("reduce_field_edits", |b| {
        b.iter(|| {
            let mut rng = thread_rng();
            let mut state = FormState::default();
            // A user typing: random participant counts and end times
            for _ in 0..100 {
                let change = if rng.gen_bool(0.5) {
                    DraftChange::Participants(Some(rng.gen_range(0..20)))
                } else {
                    DraftChange::EndTime(format!("{:02}:{:02}", rng.gen_range(8..18), rng.gen_range(0..60)))
                };
                state = reduce(state, FormEvent::FieldChanged(change), &validator);
            }
            black_box(state)
        })
    });
}

criterion_group!(benches, validate_benchmark, reduce_benchmark);
criterion_main!(benches);
