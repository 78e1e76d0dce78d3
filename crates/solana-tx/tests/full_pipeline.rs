//! Integration tests exercising the full pipeline through the public API:
//! keypair -> instructions -> message -> sign -> assemble -> parse back.

use solana_tx::compact;
use solana_tx::system::{self, sol_to_lamports};
use solana_tx::*;

fn random_keypair() -> Keypair {
    Keypair::from_seed(&rand::random::<[u8; 32]>()).unwrap()
}

fn blockhash() -> Hash {
    Hash::from([0x5a; 32])
}

// ─── Native transfer: keypair -> intent -> sign -> verify ──────────

#[test]
fn sol_full_pipeline_native_transfer() {
    // 1. Keys
    let sender = random_keypair();
    let recipient: Pubkey = "DzfXchZJoLMG3cNftcf2sw7qatkkuwQf4xH15N5wkKAb".parse().unwrap();

    // 2. Intent -> signed wire bytes
    let intent = TransferIntent::new(
        sender.pubkey(),
        recipient,
        sol_to_lamports(0.01),
        blockhash(),
    );
    let config = ClusterConfig::devnet();
    let wire = intent.sign(&config, &sender).unwrap();

    // 3. Layout: 1 signature slot, 3 accounts, 12-byte transfer data
    assert_eq!(wire.as_bytes()[0], 1);
    assert_eq!(wire.len(), 1 + 64 + 150);
    assert_eq!(&wire.as_bytes()[65..68], hex::decode("010001").unwrap().as_slice());

    // 4. Parse back and verify
    let tx = Transaction::from_wire(wire.as_bytes()).unwrap();
    tx.verify().unwrap();
    assert!(tx.is_signed());
    assert_eq!(tx.message().fee_payer(), &sender.pubkey());
    assert_eq!(
        tx.message().account_keys(),
        &[sender.pubkey(), recipient, SYSTEM_PROGRAM_ID]
    );
    assert_eq!(wire.signature(), Some(tx.signatures()[0]));

    // 5. Text encodings are non-empty and distinct
    assert_ne!(wire.to_base58(), wire.to_base64());
}

#[test]
fn generic_transfer_instruction_byte_layout() {
    let payer = Keypair::from_seed(&[1u8; 32]).unwrap();
    let to = Pubkey::from([2u8; 32]);
    let lamports: u64 = 1_000_000;

    let ix = Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::new(payer.pubkey(), true),
            AccountMeta::new(to, false),
        ],
        lamports.to_le_bytes().to_vec(),
    );
    let message = Message::compile(&payer.pubkey(), &[ix], &blockhash()).unwrap();
    let bytes = message.serialize().unwrap();

    let mut expected = vec![1u8, 0, 1, 3];
    expected.extend_from_slice(payer.pubkey().as_ref());
    expected.extend_from_slice(to.as_ref());
    expected.extend_from_slice(&[0u8; 32]);
    expected.extend_from_slice(&[0x5a; 32]);
    expected.extend_from_slice(&[1, 2, 2, 0, 1, 8]);
    expected.extend_from_slice(&lamports.to_le_bytes());
    assert_eq!(bytes, expected);

    let signature = payer.sign_message(&bytes);
    let wire = assemble(&message, &[signature]).unwrap();
    assert_eq!(wire.len(), 1 + 64 + bytes.len());
    assert_eq!(&wire.as_bytes()[1..65], signature.as_ref());
    assert_eq!(&wire.as_bytes()[65..], bytes.as_slice());
}

// ─── Assembly failures ─────────────────────────────────────────────

#[test]
fn assemble_without_signatures_reports_missing_index() {
    let payer = random_keypair();
    let message =
        TransferIntent::new(payer.pubkey(), Pubkey::from([2u8; 32]), 1, blockhash())
            .build_message(&ClusterConfig::default())
            .unwrap();

    let none: [Signature; 0] = [];
    let err = assemble(&message, &none).unwrap_err();
    assert_eq!(
        err,
        TxError::MissingSignature {
            expected: 1,
            provided: 0,
            missing: vec![0],
        }
    );
}

#[test]
fn packet_ceiling_is_inclusive() {
    let payer = random_keypair();
    let build = |len: usize| {
        let ix = Instruction::new(
            Pubkey::from([9u8; 32]),
            vec![AccountMeta::new(payer.pubkey(), true)],
            vec![0xab; len],
        );
        let message = Message::compile(&payer.pubkey(), &[ix], &blockhash()).unwrap();
        let signature = payer.sign_message(&message.serialize().unwrap());
        assemble(&message, &[signature])
    };

    assert_eq!(build(1060).unwrap().len(), PACKET_DATA_SIZE);
    assert_eq!(
        build(1061).unwrap_err(),
        TxError::TransactionTooLarge {
            size: 1233,
            max: 1232,
            overflow: 1,
        }
    );
}

#[test]
fn out_of_range_account_index_is_rejected() {
    let header = MessageHeader {
        num_required_signatures: 1,
        num_readonly_signed_accounts: 0,
        num_readonly_unsigned_accounts: 1,
    };
    let keys = vec![
        Pubkey::from([1u8; 32]),
        Pubkey::from([2u8; 32]),
        Pubkey::from([3u8; 32]),
    ];
    let ix = CompiledInstruction::new(2, vec![0, 5], vec![]);

    let err = Message::new(header, keys, blockhash(), vec![ix]).unwrap_err();
    assert!(matches!(
        err,
        TxError::AccountIndexOutOfRange {
            index: 5,
            num_accounts: 3,
            ..
        }
    ));
}

// ─── Compact lengths at the boundaries ─────────────────────────────

#[test]
fn compact_length_boundaries() {
    assert_eq!(compact::encode_length(0).unwrap(), vec![0x00]);
    assert_eq!(compact::encode_length(0xfc).unwrap(), vec![0xfc]);
    assert_eq!(compact::encode_length(0xfd).unwrap(), vec![0xfd, 0xfd, 0x00]);
    assert_eq!(compact::encode_length(0xffff).unwrap(), vec![0xfd, 0xff, 0xff]);
    assert!(matches!(
        compact::encode_length(0x1_0000),
        Err(TxError::EncodingError(_))
    ));
    assert!(matches!(
        compact::decode_length(&[0xfd, 0x01]),
        Err(TxError::MalformedInput(_))
    ));
}

// ─── Multi-signer: partial signing of raw bytes ────────────────────

#[test]
fn two_signers_fill_their_own_slots() {
    let payer = random_keypair();
    let new_account = random_keypair();
    let owner = Pubkey::from([7u8; 32]);

    let ix = SystemProgram::default().create_account(
        &payer.pubkey(),
        &new_account.pubkey(),
        2_039_280,
        165,
        &owner,
    );
    let message = Message::compile(&payer.pubkey(), &[ix], &blockhash()).unwrap();
    assert_eq!(message.num_required_signatures(), 2);

    // Unsigned transport form: placeholder slots, then the message.
    let mut raw = vec![2u8];
    raw.extend_from_slice(&[0u8; 128]);
    raw.extend_from_slice(&message.serialize().unwrap());

    let half = sign_raw_transaction(&payer, &raw).unwrap();
    let partial = Transaction::from_wire(half.as_bytes()).unwrap();
    assert!(!partial.is_signed());
    assert!(!partial.signatures()[0].is_placeholder());
    assert!(partial.signatures()[1].is_placeholder());

    let full = sign_raw_transaction(&new_account, half.as_bytes()).unwrap();
    let tx = Transaction::from_wire(full.as_bytes()).unwrap();
    tx.verify().unwrap();

    // Same bytes as signing the structured transaction directly.
    let mut direct = Transaction::new_unsigned(message);
    direct.sign(&[&new_account, &payer]).unwrap();
    assert_eq!(direct.assemble(&TransactionAssembler::default()).unwrap(), full);
}

#[test]
fn stranger_cannot_sign() {
    let payer = random_keypair();
    let message = Message::compile(
        &payer.pubkey(),
        &[system::transfer(&payer.pubkey(), &Pubkey::from([2u8; 32]), 5)],
        &blockhash(),
    )
    .unwrap();

    let mut tx = Transaction::new_unsigned(message);
    let err = tx.sign(&[&random_keypair()]).unwrap_err();
    assert!(matches!(err, TxError::SignerNotFound(_)));
}

// ─── Cluster config from JSON ──────────────────────────────────────

#[test]
fn json_config_drives_packet_ceiling() {
    let config = ClusterConfig::from_json(
        r#"{
            "name": "localnet",
            "http_endpoint": "http://127.0.0.1:8899",
            "ws_endpoint": "ws://127.0.0.1:8900",
            "max_packet_size": 200
        }"#,
    )
    .unwrap();
    assert_eq!(config.system_program_id, SYSTEM_PROGRAM_ID);

    let payer = random_keypair();
    let intent = TransferIntent::new(payer.pubkey(), Pubkey::from([2u8; 32]), 1, blockhash());
    let err = intent.sign(&config, &payer).unwrap_err();
    assert_eq!(
        err,
        TxError::TransactionTooLarge {
            size: 215,
            max: 200,
            overflow: 15,
        }
    );
}
