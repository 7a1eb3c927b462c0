// C to assembly lowering
//
// A single-pass accumulator code generator. Every expression leaves its value
// in V0; binary operators spill the left operand to the stack and pop it into
// T0. Locals live in a frame addressed through FP so pushes never move them.
// Branch and jump delay slots are always filled with NOP.

use std::collections::HashMap;

use super::ast::*;
use super::error::CcError;

const ARG_REGS: [&str; 4] = ["a0", "a1", "a2", "a3"];
/// Home area a callee may spill its register arguments into
const ARG_HOME: i64 = 16;

#[derive(Debug, Clone, Copy)]
struct Local {
    offset: i64,
    ty: CType,
    array: bool,
}

#[derive(Debug, Clone, Copy)]
struct Global {
    ty: CType,
    array: bool,
}

/// Per-function state.
struct Frame {
    name: String,
    scopes: Vec<HashMap<String, Local>>,
    next_offset: i64,
    loops: Vec<(String, String)>,
    labels: usize,
}

impl Frame {
    fn lookup(&self, name: &str) -> Option<Local> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }
}

pub struct Emitter {
    code: Vec<String>,
    data: Vec<String>,
    strings: Vec<String>,
    globals: HashMap<String, Global>,
    functions: HashMap<String, CType>,
    frame: Option<Frame>,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn load_op(ty: CType) -> &'static str {
    match (ty.size(), ty.unsigned) {
        (1, true) => "lbu",
        (1, false) => "lb",
        (2, true) => "lhu",
        (2, false) => "lh",
        _ => "lw",
    }
}

fn store_op(ty: CType) -> &'static str {
    match ty.size() {
        1 => "sb",
        2 => "sh",
        _ => "sw",
    }
}

fn align(value: i64, to: i64) -> i64 {
    (value + to - 1) / to * to
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            code: Vec::new(),
            data: Vec::new(),
            strings: Vec::new(),
            globals: HashMap::new(),
            functions: HashMap::new(),
            frame: None,
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.code.push(format!("  {}", line.into()));
    }

    fn label(&mut self, name: &str) {
        self.code.push(format!("{}:", name));
    }

    fn frame(&mut self, line: usize) -> Result<&mut Frame, CcError> {
        self.frame
            .as_mut()
            .ok_or_else(|| CcError::SemanticError("code outside a function".to_string(), line))
    }

    fn new_label(&mut self, line: usize) -> Result<String, CcError> {
        let frame = self.frame(line)?;
        let label = format!("{}_L{}", frame.name, frame.labels);
        frame.labels += 1;
        Ok(label)
    }

    fn push(&mut self) {
        self.emit("addiu sp, sp, -4");
        self.emit("sw v0, 0(sp)");
    }

    fn pop(&mut self, reg: &str) {
        self.emit(format!("lw {}, 0(sp)", reg));
        self.emit("addiu sp, sp, 4");
    }

    fn branch(&mut self, op: &str, target: &str) {
        self.emit(format!("{} {}", op, target));
        self.emit("nop");
    }

    fn intern(&mut self, text: &str) -> String {
        let index = match self.strings.iter().position(|s| s == text) {
            Some(index) => index,
            None => {
                self.strings.push(text.to_string());
                self.strings.len() - 1
            }
        };
        format!("cc_str_{}", index)
    }

    /// Truncate V0 to the width of `ty`.
    fn narrow(&mut self, ty: CType) {
        if ty.is_pointer() {
            return;
        }
        match (ty.base, ty.unsigned) {
            (BaseType::Char, true) => self.emit("andi v0, v0, 0xFF"),
            (BaseType::Short, true) => self.emit("andi v0, v0, 0xFFFF"),
            (BaseType::Char, false) => {
                self.emit("sll v0, v0, 24");
                self.emit("sra v0, v0, 24");
            }
            (BaseType::Short, false) => {
                self.emit("sll v0, v0, 16");
                self.emit("sra v0, v0, 16");
            }
            _ => {}
        }
    }

    /// Multiply `reg` by a pointer stride.
    fn scale(&mut self, reg: &str, stride: i64) {
        match stride {
            1 => {}
            2 => self.emit(format!("sll {0}, {0}, 1", reg)),
            4 => self.emit(format!("sll {0}, {0}, 2", reg)),
            n => {
                self.emit(format!("li at, {}", n));
                self.emit(format!("mult {}, at", reg));
                self.emit(format!("mflo {}", reg));
            }
        }
    }

    // Program

    pub fn program(mut self, program: &Program) -> Result<String, CcError> {
        let mut defined: Vec<&Function> = Vec::new();
        for item in &program.items {
            match item {
                Item::Function(function) => {
                    if defined.iter().any(|f| f.name == function.name) {
                        return Err(CcError::DuplicateSymbol(function.name.clone(), function.line));
                    }
                    self.functions.insert(function.name.clone(), function.return_type);
                    defined.push(function);
                }
                Item::Prototype { name, return_type } => {
                    self.functions.insert(name.clone(), *return_type);
                }
                Item::Extern { name, ty, array } => {
                    self.globals.insert(name.clone(), Global { ty: *ty, array: *array });
                }
                Item::Global { name, ty, array, init, line } => {
                    if self.globals.contains_key(name) {
                        return Err(CcError::DuplicateSymbol(name.clone(), *line));
                    }
                    self.globals.insert(
                        name.clone(),
                        Global {
                            ty: *ty,
                            array: array.is_some(),
                        },
                    );
                    self.global_data(name, *ty, *array, init.as_ref());
                }
            }
        }

        let main = defined
            .iter()
            .position(|f| f.name == "main")
            .ok_or(CcError::MissingMain)?;
        // The event entry point is the first instruction
        let main = defined.remove(main);
        defined.insert(0, main);

        for function in defined {
            self.function(function)?;
        }

        let mut out = self.code.join("\n");
        out.push('\n');
        if !self.strings.is_empty() || !self.data.is_empty() {
            out.push_str(".align 4\n");
            for (index, text) in self.strings.iter().enumerate() {
                out.push_str(&format!("cc_str_{}:\n  .asciiz \"{}\"\n", index, escape(text)));
            }
            for line in &self.data {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(".align 4\n");
        }
        Ok(out)
    }

    fn global_data(&mut self, name: &str, ty: CType, array: Option<u32>, init: Option<&GlobalInit>) {
        let directive = match ty.size() {
            1 => ".byte",
            2 => ".halfword",
            _ => ".word",
        };
        let count = array.unwrap_or(1) as usize;
        let size = ty.size() as usize * count;
        self.data.push(format!(".align {}", ty.size().max(1)));
        self.data.push(format!("{}:", name));
        match init {
            None => self.data.push(format!("  .fill {}", size)),
            Some(GlobalInit::Scalar(value)) => self.data.push(format!("  {} {}", directive, value)),
            Some(GlobalInit::List(values)) => {
                let shown: Vec<String> = values.iter().take(count).map(|v| v.to_string()).collect();
                self.data.push(format!("  {} {}", directive, shown.join(", ")));
                let rest = count.saturating_sub(values.len()) * ty.size() as usize;
                if rest > 0 {
                    self.data.push(format!("  .fill {}", rest));
                }
            }
            Some(GlobalInit::Str(text)) if array.is_some() => {
                self.data.push(format!("  .ascii \"{}\"", escape(text)));
                let rest = size.saturating_sub(text.len());
                if rest > 0 {
                    self.data.push(format!("  .fill {}", rest));
                }
            }
            Some(GlobalInit::Str(text)) => {
                let label = self.intern(text);
                self.data.push(format!("  .word {}", label));
            }
        }
    }

    fn function(&mut self, function: &Function) -> Result<(), CcError> {
        if function.params.len() > ARG_REGS.len() {
            return Err(CcError::SemanticError(
                format!("{} takes more than {} parameters", function.name, ARG_REGS.len()),
                function.line,
            ));
        }
        let outer = std::mem::take(&mut self.code);
        self.frame = Some(Frame {
            name: function.name.clone(),
            scopes: vec![HashMap::new()],
            next_offset: ARG_HOME,
            loops: Vec::new(),
            labels: 0,
        });

        let mut param_stores = Vec::new();
        for (index, param) in function.params.iter().enumerate() {
            let local = self.declare(&param.name, param.ty, None, function.line)?;
            param_stores.push(format!("  sw {}, {}(fp)", ARG_REGS[index], local.offset));
        }
        for stmt in &function.body {
            self.statement(stmt)?;
        }

        let body = std::mem::replace(&mut self.code, outer);
        let frame = self
            .frame
            .take()
            .ok_or_else(|| CcError::SemanticError("lost function frame".to_string(), function.line))?;
        let size = align(frame.next_offset + 8, 8);

        self.label(&function.name);
        self.emit(format!("addiu sp, sp, -{}", size));
        self.emit(format!("sw ra, {}(sp)", size - 4));
        self.emit(format!("sw fp, {}(sp)", size - 8));
        self.emit("move fp, sp");
        self.code.extend(param_stores);
        self.code.extend(body);
        self.label(&format!("{}_return", function.name));
        self.emit("move sp, fp");
        self.emit(format!("lw ra, {}(sp)", size - 4));
        self.emit(format!("lw fp, {}(sp)", size - 8));
        self.emit("jr ra");
        self.emit(format!("addiu sp, sp, {}", size));
        log::trace!("Lowered {} with a {} byte frame", function.name, size);
        Ok(())
    }

    fn declare(
        &mut self,
        name: &str,
        ty: CType,
        array: Option<u32>,
        line: usize,
    ) -> Result<Local, CcError> {
        let frame = self.frame(line)?;
        let scope = frame
            .scopes
            .last_mut()
            .ok_or_else(|| CcError::SemanticError("no open scope".to_string(), line))?;
        if scope.contains_key(name) {
            return Err(CcError::DuplicateSymbol(name.to_string(), line));
        }
        let bytes = match array {
            Some(n) => align(ty.size() as i64 * n as i64, 4),
            None => 4,
        };
        let local = Local {
            offset: frame.next_offset,
            ty,
            array: array.is_some(),
        };
        frame.next_offset += bytes;
        scope.insert(name.to_string(), local);
        Ok(local)
    }

    // Statements

    fn statement(&mut self, stmt: &Stmt) -> Result<(), CcError> {
        match stmt {
            Stmt::Empty => {}
            Stmt::Expression(expr) => {
                self.expr(expr)?;
            }
            Stmt::Declare(decls) => {
                for decl in decls {
                    if let Some(init) = &decl.init {
                        // The initializer cannot see the name it defines
                        self.expr(init)?;
                        let local = self.declare(&decl.name, decl.ty, decl.array, decl.line)?;
                        self.narrow(decl.ty);
                        self.emit(format!("sw v0, {}(fp)", local.offset));
                    } else {
                        self.declare(&decl.name, decl.ty, decl.array, decl.line)?;
                    }
                }
            }
            Stmt::Block(stmts) => {
                self.frame(0)?.scopes.push(HashMap::new());
                for stmt in stmts {
                    self.statement(stmt)?;
                }
                self.frame(0)?.scopes.pop();
            }
            Stmt::If(condition, then, otherwise) => {
                let else_label = self.new_label(condition.line)?;
                self.expr(condition)?;
                self.branch("beqz v0,", &else_label);
                self.statement(then)?;
                match otherwise {
                    Some(otherwise) => {
                        let end = self.new_label(condition.line)?;
                        self.branch("b", &end);
                        self.label(&else_label);
                        self.statement(otherwise)?;
                        self.label(&end);
                    }
                    None => self.label(&else_label),
                }
            }
            Stmt::While(condition, body) => {
                let top = self.new_label(condition.line)?;
                let end = self.new_label(condition.line)?;
                self.label(&top);
                self.expr(condition)?;
                self.branch("beqz v0,", &end);
                self.loop_body(body, &end, &top)?;
                self.branch("b", &top);
                self.label(&end);
            }
            Stmt::DoWhile(body, condition) => {
                let top = self.new_label(condition.line)?;
                let next = self.new_label(condition.line)?;
                let end = self.new_label(condition.line)?;
                self.label(&top);
                self.loop_body(body, &end, &next)?;
                self.label(&next);
                self.expr(condition)?;
                self.branch("bnez v0,", &top);
                self.label(&end);
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                self.frame(0)?.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.statement(init)?;
                }
                let top = self.new_label(0)?;
                let next = self.new_label(0)?;
                let end = self.new_label(0)?;
                self.label(&top);
                if let Some(condition) = condition {
                    self.expr(condition)?;
                    self.branch("beqz v0,", &end);
                }
                self.loop_body(body, &end, &next)?;
                self.label(&next);
                if let Some(step) = step {
                    self.expr(step)?;
                }
                self.branch("b", &top);
                self.label(&end);
                self.frame(0)?.scopes.pop();
            }
            Stmt::Return(value, line) => {
                if let Some(value) = value {
                    self.expr(value)?;
                }
                let name = self.frame(*line)?.name.clone();
                self.branch("b", &format!("{}_return", name));
            }
            Stmt::Break(line) | Stmt::Continue(line) => {
                let is_break = matches!(stmt, Stmt::Break(_));
                let target = self
                    .frame(*line)?
                    .loops
                    .last()
                    .map(|(end, next)| if is_break { end.clone() } else { next.clone() })
                    .ok_or_else(|| {
                        CcError::SemanticError(
                            format!("'{}' outside a loop", if is_break { "break" } else { "continue" }),
                            *line,
                        )
                    })?;
                self.branch("b", &target);
            }
        }
        Ok(())
    }

    fn loop_body(&mut self, body: &Stmt, end: &str, next: &str) -> Result<(), CcError> {
        self.frame(0)?.loops.push((end.to_string(), next.to_string()));
        self.statement(body)?;
        self.frame(0)?.loops.pop();
        Ok(())
    }

    // Expressions

    fn local(&self, name: &str) -> Option<Local> {
        self.frame.as_ref().and_then(|frame| frame.lookup(name))
    }

    /// Evaluate `expr` into V0 and return its type.
    fn expr(&mut self, expr: &Expr) -> Result<CType, CcError> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Number(n) => {
                self.emit(format!("li v0, {}", *n as i32));
                Ok(CType::INT)
            }
            ExprKind::SizeofType(ty) => {
                self.emit(format!("li v0, {}", ty.size()));
                Ok(CType::INT)
            }
            ExprKind::Str(text) => {
                let label = self.intern(text);
                self.emit(format!("la v0, {}", label));
                Ok(CType {
                    base: BaseType::Char,
                    unsigned: false,
                    pointers: 1,
                })
            }
            ExprKind::Identifier(name) => self.identifier(name),
            ExprKind::Comma(first, second) => {
                self.expr(first)?;
                self.expr(second)
            }
            ExprKind::Cast(ty, inner) => {
                self.expr(inner)?;
                self.narrow(*ty);
                Ok(*ty)
            }
            ExprKind::Unary(op, inner) => match op {
                UnaryOp::Neg => {
                    let ty = self.expr(inner)?;
                    self.emit("subu v0, zero, v0");
                    Ok(ty)
                }
                UnaryOp::Not => {
                    self.expr(inner)?;
                    self.emit("sltiu v0, v0, 1");
                    Ok(CType::INT)
                }
                UnaryOp::BitNot => {
                    let ty = self.expr(inner)?;
                    self.emit("nor v0, v0, zero");
                    Ok(ty)
                }
                UnaryOp::Deref => {
                    let ty = self.expr(inner)?;
                    self.load_through(ty, line)
                }
                UnaryOp::AddressOf => self.address_of(inner),
            },
            ExprKind::Index(base, index) => {
                let sum = Expr::new(ExprKind::Binary(BinaryOp::Add, base.clone(), index.clone()), line);
                let ty = self.expr(&sum)?;
                self.load_through(ty, line)
            }
            ExprKind::Binary(BinaryOp::And, left, right) | ExprKind::Binary(BinaryOp::Or, left, right) => {
                let is_and = matches!(expr.kind, ExprKind::Binary(BinaryOp::And, _, _));
                let end = self.new_label(line)?;
                self.expr(left)?;
                self.branch(if is_and { "beqz v0," } else { "bnez v0," }, &end);
                self.expr(right)?;
                self.label(&end);
                self.emit("sltu v0, zero, v0");
                Ok(CType::INT)
            }
            ExprKind::Binary(op, left, right) => {
                let lt = self.expr(left)?;
                self.push();
                let rt = self.expr(right)?;
                self.pop("t0");
                self.binary(*op, lt, rt)
            }
            ExprKind::Assign(target, value) => self.assign(target, value),
            ExprKind::CompoundAssign(op, target, value) => {
                let combined = Expr::new(ExprKind::Binary(*op, target.clone(), value.clone()), line);
                self.assign(target, &combined)
            }
            ExprKind::IncDec {
                target,
                delta,
                prefix,
            } => {
                let step = Expr::new(
                    ExprKind::Binary(
                        BinaryOp::Add,
                        target.clone(),
                        Box::new(Expr::new(ExprKind::Number(*delta), line)),
                    ),
                    line,
                );
                let ty = self.assign(target, &step)?;
                if !prefix {
                    self.emit(format!("addiu v0, v0, {}", -delta * ty.stride()));
                }
                Ok(ty)
            }
            ExprKind::Conditional(condition, then, otherwise) => {
                let else_label = self.new_label(line)?;
                let end = self.new_label(line)?;
                self.expr(condition)?;
                self.branch("beqz v0,", &else_label);
                let ty = self.expr(then)?;
                self.branch("b", &end);
                self.label(&else_label);
                self.expr(otherwise)?;
                self.label(&end);
                Ok(ty)
            }
            ExprKind::Call(name, args) => self.call(name, args, line),
        }
    }

    fn identifier(&mut self, name: &str) -> Result<CType, CcError> {
        if let Some(local) = self.local(name) {
            if local.array {
                self.emit(format!("addiu v0, fp, {}", local.offset));
                return Ok(local.ty.pointer_to());
            }
            self.emit(format!("lw v0, {}(fp)", local.offset));
            return Ok(local.ty);
        }
        if let Some(global) = self.globals.get(name).copied() {
            if global.array {
                self.emit(format!("la v0, {}", name));
                return Ok(global.ty.pointer_to());
            }
            self.emit(format!("lui at, hi({})", name));
            self.emit(format!("{} v0, lo({})(at)", load_op(global.ty), name));
            return Ok(global.ty);
        }
        if self.functions.contains_key(name) {
            self.emit(format!("la v0, {}", name));
            return Ok(CType::INT);
        }
        // Anything else is an assembler symbol: a parameter or game constant
        self.emit(format!("li v0, {}", name));
        Ok(CType::INT)
    }

    fn load_through(&mut self, pointer: CType, line: usize) -> Result<CType, CcError> {
        let target = pointer.pointee().ok_or_else(|| {
            CcError::SemanticError(format!("cannot dereference a value of type {}", pointer), line)
        })?;
        if target.is_void() {
            return Err(CcError::SemanticError("cannot dereference void*".to_string(), line));
        }
        self.emit(format!("{} v0, 0(v0)", load_op(target)));
        Ok(target)
    }

    fn address_of(&mut self, inner: &Expr) -> Result<CType, CcError> {
        match &inner.kind {
            ExprKind::Identifier(name) => {
                if let Some(local) = self.local(name) {
                    self.emit(format!("addiu v0, fp, {}", local.offset));
                    return Ok(local.ty.pointer_to());
                }
                if let Some(global) = self.globals.get(name).copied() {
                    self.emit(format!("la v0, {}", name));
                    return Ok(global.ty.pointer_to());
                }
                // Address of a game symbol
                self.emit(format!("la v0, {}", name));
                Ok(CType::INT.pointer_to())
            }
            ExprKind::Unary(UnaryOp::Deref, pointer) => self.expr(pointer),
            ExprKind::Index(base, index) => {
                let sum = Expr::new(
                    ExprKind::Binary(BinaryOp::Add, base.clone(), index.clone()),
                    inner.line,
                );
                self.expr(&sum)
            }
            _ => Err(CcError::SemanticError(
                "cannot take the address of this expression".to_string(),
                inner.line,
            )),
        }
    }

    /// Store `value` into `target`; V0 holds the stored value afterwards.
    fn assign(&mut self, target: &Expr, value: &Expr) -> Result<CType, CcError> {
        let line = target.line;
        match &target.kind {
            ExprKind::Identifier(name) => {
                if let Some(local) = self.local(name).filter(|l| !l.array) {
                    self.expr(value)?;
                    self.narrow(local.ty);
                    self.emit(format!("sw v0, {}(fp)", local.offset));
                    return Ok(local.ty);
                }
                if let Some(global) = self.globals.get(name).copied().filter(|g| !g.array) {
                    self.expr(value)?;
                    self.narrow(global.ty);
                    self.emit(format!("lui at, hi({})", name));
                    self.emit(format!("{} v0, lo({})(at)", store_op(global.ty), name));
                    return Ok(global.ty);
                }
                Err(CcError::UndefinedVariable(name.clone(), line))
            }
            ExprKind::Unary(UnaryOp::Deref, _) | ExprKind::Index(_, _) => {
                let pointer = self.address_of(target)?;
                let ty = pointer.pointee().unwrap_or(CType::INT);
                if !pointer.is_pointer() || ty.is_void() {
                    return Err(CcError::SemanticError(
                        format!("cannot store through a value of type {}", pointer),
                        line,
                    ));
                }
                self.push();
                self.expr(value)?;
                self.pop("t0");
                self.narrow(ty);
                self.emit(format!("{} v0, 0(t0)", store_op(ty)));
                Ok(ty)
            }
            _ => Err(CcError::SemanticError(
                "left side of assignment is not assignable".to_string(),
                line,
            )),
        }
    }

    /// Apply `op` with the left operand in T0 and the right in V0.
    fn binary(&mut self, op: BinaryOp, lt: CType, rt: CType) -> Result<CType, CcError> {
        let unsigned = lt.unsigned || rt.unsigned || lt.is_pointer() || rt.is_pointer();
        let arithmetic = if lt.is_pointer() {
            lt
        } else if rt.is_pointer() {
            rt
        } else {
            CType {
                unsigned: lt.unsigned || rt.unsigned,
                ..CType::INT
            }
        };
        match op {
            BinaryOp::Add => {
                if lt.is_pointer() && !rt.is_pointer() {
                    self.scale("v0", lt.stride());
                } else if rt.is_pointer() && !lt.is_pointer() {
                    self.scale("t0", rt.stride());
                }
                self.emit("addu v0, t0, v0");
                Ok(arithmetic)
            }
            BinaryOp::Sub => {
                if lt.is_pointer() && rt.is_pointer() {
                    self.emit("subu v0, t0, v0");
                    match lt.stride() {
                        1 => {}
                        2 => self.emit("sra v0, v0, 1"),
                        4 => self.emit("sra v0, v0, 2"),
                        n => {
                            self.emit(format!("li at, {}", n));
                            self.emit("div v0, at");
                            self.emit("mflo v0");
                        }
                    }
                    return Ok(CType::INT);
                }
                if lt.is_pointer() {
                    self.scale("v0", lt.stride());
                }
                self.emit("subu v0, t0, v0");
                Ok(arithmetic)
            }
            BinaryOp::Mul => {
                self.emit("mult t0, v0");
                self.emit("mflo v0");
                Ok(arithmetic)
            }
            BinaryOp::Div | BinaryOp::Mod => {
                self.emit(if unsigned { "divu t0, v0" } else { "div t0, v0" });
                self.emit(if op == BinaryOp::Div { "mflo v0" } else { "mfhi v0" });
                Ok(arithmetic)
            }
            BinaryOp::Shl => {
                self.emit("sllv v0, t0, v0");
                Ok(lt)
            }
            BinaryOp::Shr => {
                self.emit(if lt.unsigned { "srlv v0, t0, v0" } else { "srav v0, t0, v0" });
                Ok(lt)
            }
            BinaryOp::BitAnd => {
                self.emit("and v0, t0, v0");
                Ok(arithmetic)
            }
            BinaryOp::BitOr => {
                self.emit("or v0, t0, v0");
                Ok(arithmetic)
            }
            BinaryOp::BitXor => {
                self.emit("xor v0, t0, v0");
                Ok(arithmetic)
            }
            BinaryOp::Eq => {
                self.emit("xor v0, t0, v0");
                self.emit("sltiu v0, v0, 1");
                Ok(CType::INT)
            }
            BinaryOp::Ne => {
                self.emit("xor v0, t0, v0");
                self.emit("sltu v0, zero, v0");
                Ok(CType::INT)
            }
            BinaryOp::Lt | BinaryOp::Ge => {
                self.emit(if unsigned { "sltu v0, t0, v0" } else { "slt v0, t0, v0" });
                if op == BinaryOp::Ge {
                    self.emit("xori v0, v0, 1");
                }
                Ok(CType::INT)
            }
            BinaryOp::Gt | BinaryOp::Le => {
                self.emit(if unsigned { "sltu v0, v0, t0" } else { "slt v0, v0, t0" });
                if op == BinaryOp::Le {
                    self.emit("xori v0, v0, 1");
                }
                Ok(CType::INT)
            }
            BinaryOp::And | BinaryOp::Or => Err(CcError::SemanticError(
                "logical operator reached the arithmetic lowering".to_string(),
                0,
            )),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], line: usize) -> Result<CType, CcError> {
        if args.len() > ARG_REGS.len() {
            return Err(CcError::SemanticError(
                format!("call to {} passes more than {} arguments", name, ARG_REGS.len()),
                line,
            ));
        }
        for arg in args {
            self.expr(arg)?;
            self.push();
        }
        for index in (0..args.len()).rev() {
            self.pop(ARG_REGS[index]);
        }
        self.emit(format!("addiu sp, sp, -{}", ARG_HOME));
        self.emit(format!("jal {}", name));
        self.emit("nop");
        self.emit(format!("addiu sp, sp, {}", ARG_HOME));
        Ok(self.functions.get(name).copied().unwrap_or(CType::INT))
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::new()
    }
}
