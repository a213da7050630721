mod common;

use proposal_pdf::model::ProposalStatus;
use proposal_pdf::snapshot::{self, ProposalRecord};

/// The record shape as the PostgREST nested embed returns it.
#[test]
fn deserializes_nested_embed_payload() {
    let payload = serde_json::json!({
        "id": 31,
        "customer_name": "Acme Clinics",
        "customer_email": "ads@acme.example",
        "city": "São Paulo",
        "status": "em_analise",
        "created_at": "2026-08-01T12:30:00Z",
        "start_date": "2026-09-01",
        "end_date": "2026-09-30",
        "cpm_mode": "manual",
        "cpm_value": 28.5,
        "discount_pct": 10.0,
        "discount_fixed": 0.0,
        "agencias": { "nome_agencia": "Agência Alfa" },
        "agencia_projetos": { "nome_projeto": "Verão 2026", "cliente_final": "Acme Matriz" },
        "proposal_screens": [
            {
                "screen_id": 900,
                "custom_cpm": 35.0,
                "screens": {
                    "id": 900,
                    "code": "TV-900",
                    "name": null,
                    "city": "São Paulo",
                    "state": "SP",
                    "class": "AB",
                    "daily_audience": 1800.0,
                    "venues": { "name": "Shopping Central" }
                }
            }
        ]
    });

    let record: ProposalRecord = serde_json::from_value(payload).unwrap();
    let snap = snapshot::build(record);

    assert_eq!(snap.header.id, 31);
    assert_eq!(snap.header.status, ProposalStatus::UnderReview);
    assert_eq!(snap.header.agency_name, "Agência Alfa");
    assert_eq!(snap.header.final_client, "Acme Matriz");
    assert_eq!(snap.header.start_date.unwrap().to_string(), "2026-09-01");

    let item = &snap.items[0];
    assert_eq!(item.effective_cpm, 35.0);
    // Venue name backfills a missing screen name.
    assert_eq!(item.name, "Shopping Central");
}

#[test]
fn minimal_payload_resolves_every_field() {
    let payload = serde_json::json!({ "id": 55 });
    let record: ProposalRecord = serde_json::from_value(payload).unwrap();
    let snap = snapshot::build(record);

    assert_eq!(snap.header.customer_name, "—");
    assert_eq!(snap.header.status, ProposalStatus::Draft);
    assert_eq!(snap.header.discount_pct, 0.0);
    assert!(snap.items.is_empty());
}

#[test]
fn unknown_status_falls_back_to_draft() {
    assert_eq!(ProposalStatus::parse("whatever"), ProposalStatus::Draft);
    assert_eq!(ProposalStatus::parse("aceita"), ProposalStatus::Accepted);
    assert_eq!(ProposalStatus::parse("rejeitada").label(), "Rejeitada");
}

#[test]
fn final_client_falls_back_to_customer_name() {
    let mut record = common::record(56, vec![]);
    record.agencia_projetos = None;
    let snap = snapshot::build(record);
    assert_eq!(snap.header.final_client, "Acme Ltda");
}
