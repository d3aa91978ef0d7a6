use crate::*;
use sr32::*;


fn assemble_ok(src: &str) -> Image {
    match assemble(src) {
        Ok(image) => image,
        Err(err) => panic!("assembly failed:\n{}", err),
    }
}

fn words(image: &Image) -> Vec<u32> {
    image.entries().iter().map(|entry| entry.word).collect()
}

#[test]
fn alu_register_and_immediate_forms() {
    let image = assemble_ok(
        "add x3, x4, x5\n\
         addi x3, x4, #-2\n\
         sltu x6, x7, x8\n\
         mul x9, x10, x11\n\
         divi x9, x9, 3\n",
    );

    assert_eq!(
        words(&image),
        vec![
            make_alu_reg(AluOp::ADD, 3, 4, 5),
            make_alu_imm(AluOp::ADD, 3, 4, -2i32 as u32),
            make_alu_reg(AluOp::SLTU, 6, 7, 8),
            make_alu_reg(AluOp::MUL, 9, 10, 11),
            make_alu_imm(AluOp::DIV, 9, 9, 3),
        ]
    );
}

#[test]
fn register_aliases_and_case() {
    let image = assemble_ok("ADD SP, RA, ZeRo\n");
    assert_eq!(words(&image), vec![make_alu_reg(AluOp::ADD, 2, 1, 0)]);
}

#[test]
fn words_are_placed_from_the_origin() {
    let image = assemble_ok("nop\nnop\n");
    let entries = image.entries();
    assert_eq!(entries[0].address, 0x0010_0000);
    assert_eq!(entries[1].address, 0x0010_0004);
    assert_eq!(image.pc(), 0x0010_0008);
}

#[test]
fn forward_branch_resolves_to_the_gap() {
    let image = assemble_ok(
        "  li x5, 0
  beq x5, x0, L
  li x5, 1
L:
  stx x5, (x6)
",
    );

    let w = words(&image);
    assert_eq!(w[1], make_branch(BranchOp::BEQ, 5, 0, 4));
    assert_eq!(w[1], 0x0004_2830);
    assert_eq!(image.label_at(0x0010_000C), Some("L"));
}

#[test]
fn backward_branch_is_negative() {
    let image = assemble_ok("top:\n  nop\n  bne x1, x2, top\n");
    assert_eq!(
        words(&image)[1],
        make_branch(BranchOp::BNE, 1, 2, -8i32 as u32)
    );
}

#[test]
fn dot_targets_the_instruction_itself() {
    let image = assemble_ok("beq x0, x0, .\n");
    assert_eq!(
        words(&image),
        vec![make_branch(BranchOp::BEQ, 0, 0, -4i32 as u32)]
    );
}

#[test]
fn jumps_and_pseudo_instructions() {
    let image = assemble_ok(
        "  jal ra, next
next:
  j next
  jr x5
  ret
  mv x3, x7
  nop
",
    );

    assert_eq!(
        words(&image),
        vec![
            make_jump(JumpOp::JAL, 1, 0),
            make_jump(JumpOp::JAL, 0, -4i32 as u32),
            make_alu_reg(AluOp::JALR, 0, 5, 0),
            make_alu_reg(AluOp::JALR, 0, 1, 0),
            make_alu_reg(AluOp::ADD, 3, 0, 7),
            make_alu_imm(AluOp::ADD, 0, 0, 0),
        ]
    );
}

#[test]
fn jalr_has_register_and_immediate_forms() {
    let image = assemble_ok("jalr x1, x5, x6\njalr x1, x5, -4\n");
    assert_eq!(
        words(&image),
        vec![
            make_alu_reg(AluOp::JALR, 1, 5, 6),
            make_alu_imm(AluOp::JALR, 1, 5, -4i32 as u32),
        ]
    );
}

#[test]
fn syscall_break_sysret() {
    let image = assemble_ok("syscall #7\nbreak\nsysret\n");
    assert_eq!(
        words(&image),
        vec![
            make_jump(JumpOp::SYSCALL, 0, 7),
            make_jump(JumpOp::BREAK, 0, 0),
            make_jump(JumpOp::SYSRET, 0, 0),
        ]
    );
}

#[test]
fn memref_forms() {
    let image = assemble_ok("ldw x1, 8(x2)\nldh x1, (x2)\nstb x1, 0x20\n");
    assert_eq!(
        words(&image),
        vec![
            make_load(LoadOp::LDW, 1, 2, 8),
            make_load(LoadOp::LDH, 1, 2, 0),
            make_store(StoreOp::STB, 1, 0, 0x20),
        ]
    );
}

#[test]
fn li_splits_large_values_with_carry() {
    let image = assemble_ok("li x10, 0xDEADBEEF\nli x4, 100\nli x5, 0x12340000\n");

    assert_eq!(
        words(&image),
        vec![
            make_load(LoadOp::LUI, 10, 0, 0xDEAE),
            make_alu_imm(AluOp::ADD, 10, 10, 0xBEEF),
            make_alu_imm(AluOp::ADD, 4, 0, 100),
            // zero low half: the addi is dropped
            make_load(LoadOp::LUI, 5, 0, 0x1234),
        ]
    );
}

#[test]
fn li_label_reconstructs_the_address() {
    let image = assemble_ok("equ target, 0xCAFE8000\nli x5, target\n");

    let w = words(&image);
    assert_eq!(w[0], make_load(LoadOp::LUI, 5, 0, 0xCAFF));
    assert_eq!(w[1], make_alu_imm(AluOp::ADD, 5, 5, 0x8000));

    let hi = (w[0] >> 16) << 16;
    let lo = get_i16(w[1]);
    assert_eq!(hi.wrapping_add(lo as u32), 0xCAFE_8000);
}

#[test]
fn la_is_pc_relative() {
    let image = assemble_ok("la x5, data\nnop\ndata: word 1\n");

    assert_eq!(
        words(&image),
        vec![
            make_load(LoadOp::AUIPC, 5, 0, 0),
            // data - (la + 4) == 8
            make_alu_imm(AluOp::ADD, 5, 5, 8),
            make_alu_imm(AluOp::ADD, 0, 0, 0),
            1,
        ]
    );
}

#[test]
fn word_directive_takes_labels_as_absolute_fixups() {
    let image = assemble_ok("word entry, 5, 0x10\nentry:\nnop\n");
    assert_eq!(
        words(&image),
        vec![0x0010_000C, 5, 0x10, make_alu_imm(AluOp::ADD, 0, 0, 0)]
    );
}

#[test]
fn byte_half_and_alignment() {
    let image = assemble_ok("byte 1, 2, \"abc\"\nhalf 0x1234\nword 0xAABBCCDD\n");

    assert_eq!(
        image.bytes(),
        &[
            1, 2, b'a', b'b', b'c', 0, 0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA
        ]
    );
}

#[test]
fn labels_on_byte_data_keep_the_raw_pc() {
    let image = assemble_ok("byte \"ab\"\nmsg: byte \"c\"\nstart: nop\n");

    assert_eq!(image.label_at(0x0010_0002), Some("msg"));
    // the instruction label lands on the padded word boundary
    assert_eq!(image.label_at(0x0010_0004), Some("start"));
}

#[test]
fn labels_are_case_insensitive() {
    let image = assemble_ok("Loop:\n  j LOOP\n");
    assert_eq!(words(&image), vec![make_jump(JumpOp::JAL, 0, -4i32 as u32)]);
}

#[test]
fn comments_everywhere() {
    let image = assemble_ok("; header\n// more\nnop // trailing\nnop ; also\n");
    assert_eq!(words(&image).len(), 2);
}

#[test]
fn redefinition_is_an_error() {
    assert!(assemble("a:\na:\n").is_err());
    assert!(assemble("equ a, 1\na: nop\n").is_err());
}

#[test]
fn undefined_labels_fail_at_the_end() {
    assert!(assemble("beq x0, x0, missing\n").is_err());
    assert!(assemble("word missing\n").is_err());
}

#[test]
fn branch_range_is_checked() {
    // site + 4 == 0x100008; 0x108007 is the last reachable byte
    assert!(assemble("nop\nequ far, 0x108007\nbeq x0, x0, far\n").is_ok());
    assert!(assemble("nop\nequ far, 0x108008\nbeq x0, x0, far\n").is_err());
}

#[test]
fn jump_range_is_checked() {
    assert!(assemble("equ far, 0x200003\nj far\n").is_ok());
    assert!(assemble("equ far, 0x200004\nj far\n").is_err());
}

#[test]
fn listing_reassembles_to_the_same_words() {
    let src = "\
entry:
  li x5, 0
  li x10, 0xDEADBEEF
  beq x5, x0, done
  bne x5, x10, entry
  bltu x5, x10, done
  add x3, x4, x5
  addi x3, x3, -9
  sltu x6, x7, x8
  sll x2, x2, x3
  srai x2, x2, 3
  muli x8, x8, 10
  div x8, x8, x9
  ldw x7, 8(x2)
  ldbu x7, (x2)
  stw x7, -4(sp)
  stx x0, 0x20
  lui x9, 0xABCD0000
  auipc x9, 0
  jalr x1, x9, 4
  jalr x1, x9, x3
  jal ra, entry
  j done
  jr x5
  ret
  mv x4, x5
  nop
  syscall 3
  break
  sysret
done:
  stx x5, (x6)
";
    let image = assemble_ok(src);

    for entry in image.entries() {
        let line = format!("{}\n", entry.disasm);
        let again = match assemble_at(&line, entry.address) {
            Ok(again) => again,
            Err(err) => panic!("'{}' did not reassemble:\n{}", entry.disasm, err),
        };
        assert_eq!(
            words(&again),
            vec![entry.word],
            "at {:08x}: {}",
            entry.address,
            entry.disasm
        );
    }
}

#[test]
fn junk_is_rejected() {
    assert!(assemble("bogus x1, x2\n").is_err());
    assert!(assemble("add x1, x2\n").is_err());
    assert!(assemble("x5: nop\n").is_err());
    assert!(assemble("byte \"unterminated\n").is_err());
}
