use crate::operators;
use eidos_core::eidos_debug;
use eidos_core::{
    pool, Argument, CallContext, EidosError, EidosResult, EidosValue, Expression, FunctionImpl,
    FunctionMap, InterpreterBlock, ScopeRef, Statement, UnaryOp, ValueRc, ValueType,
};
use eidos_parser::Script;
use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

const SITE_EVAL: &str = "Interpreter::evaluate";
const SITE_SUBSCRIPT: &str = "Interpreter::evaluate_subscript";
const SITE_MEMBER: &str = "Interpreter::evaluate_member";
const SITE_CALL: &str = "Interpreter::evaluate_call";
const SITE_ASSIGN: &str = "Interpreter::evaluate_assignment";

/// Tree-walking interpreter. Evaluates a script's interpreter block against
/// a variables scope and a function map; values flow through shared
/// references with copy-on-write applied at every mutation point.
pub struct Interpreter<'a> {
    script: &'a Script,
    symbols: ScopeRef,
    function_map: Rc<FunctionMap>,
    host_context: Option<Rc<dyn Any>>,
    output: String,
    break_flag: bool,
    next_flag: bool,
    return_flag: bool,
    return_value: Option<ValueRc>,
}

impl<'a> CallContext for Interpreter<'a> {
    fn symbols(&self) -> ScopeRef {
        Rc::clone(&self.symbols)
    }

    fn output(&mut self) -> &mut String {
        &mut self.output
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(script: &'a Script, symbols: ScopeRef, function_map: Rc<FunctionMap>) -> Self {
        Self::new_with_context(script, symbols, function_map, None)
    }

    pub fn new_with_context(
        script: &'a Script,
        symbols: ScopeRef,
        function_map: Rc<FunctionMap>,
        host_context: Option<Rc<dyn Any>>,
    ) -> Self {
        Self {
            script,
            symbols,
            function_map,
            host_context,
            output: String::new(),
            break_flag: false,
            next_flag: false,
            return_flag: false,
            return_value: None,
        }
    }

    pub fn host_context(&self) -> Option<&Rc<dyn Any>> {
        self.host_context.as_ref()
    }

    /// Everything written by `cat`/`print`/`str` and top-level echo so far.
    pub fn execution_output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Evaluate the script's interpreter block. The result is the value of
    /// the last statement executed (or of `return`); with `print_output`
    /// set, each top-level non-invisible statement result is echoed to the
    /// execution output stream.
    pub fn evaluate_interpreter_block(&mut self, print_output: bool) -> EidosResult<ValueRc> {
        let block: &InterpreterBlock = self.script.ast().ok_or_else(|| {
            EidosError::internal(SITE_EVAL, "the script has not been parsed.")
        })?;

        eidos_debug!(
            "evaluating interpreter block with {} statements",
            block.statements.len()
        );

        let mut result = pool::static_null_invisible();

        for statement in &block.statements {
            result = self.execute_statement(statement)?;

            if self.return_flag {
                self.return_flag = false;
                result = self.return_value.take().unwrap_or_else(pool::static_null);
                if print_output && !result.is_invisible() {
                    self.output.push_str(&format!("{}\n", result));
                }
                return Ok(result);
            }
            // A stray break/next outside any loop is silently absorbed at
            // the block boundary.
            self.break_flag = false;
            self.next_flag = false;

            if print_output && !result.is_invisible() {
                self.output.push_str(&format!("{}\n", result));
            }
        }

        Ok(result)
    }

    /// Host-facing single-expression evaluation, used for command-line
    /// constant definitions.
    pub fn evaluate_expression_for_host(&mut self, expr: &Expression) -> EidosResult<ValueRc> {
        self.evaluate_expression(expr)
    }

    fn control_flow_pending(&self) -> bool {
        self.break_flag || self.next_flag || self.return_flag
    }

    fn execute_statement(&mut self, statement: &Statement) -> EidosResult<ValueRc> {
        match statement {
            Statement::Expression { expr, .. } => self.evaluate_expression(expr),
            Statement::Empty { .. } => Ok(pool::static_null_invisible()),
            Statement::Compound { statements, .. } => {
                for statement in statements {
                    self.execute_statement(statement)?;
                    if self.control_flow_pending() {
                        break;
                    }
                }
                Ok(pool::static_null_invisible())
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let test = self.evaluate_condition(condition, "if statement")?;
                if test {
                    self.execute_statement(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)?;
                }
                Ok(pool::static_null_invisible())
            }
            Statement::While {
                condition, body, ..
            } => {
                loop {
                    if !self.evaluate_condition(condition, "while statement")? {
                        break;
                    }
                    self.execute_statement(body)?;
                    if self.break_flag {
                        self.break_flag = false;
                        break;
                    }
                    if self.next_flag {
                        self.next_flag = false;
                        continue;
                    }
                    if self.return_flag {
                        break;
                    }
                }
                Ok(pool::static_null_invisible())
            }
            Statement::DoWhile {
                body, condition, ..
            } => {
                loop {
                    self.execute_statement(body)?;
                    if self.break_flag {
                        self.break_flag = false;
                        break;
                    }
                    if self.next_flag {
                        self.next_flag = false;
                    }
                    if self.return_flag {
                        break;
                    }
                    if !self.evaluate_condition(condition, "do-while statement")? {
                        break;
                    }
                }
                Ok(pool::static_null_invisible())
            }
            Statement::For {
                variable_id,
                range,
                body,
                ..
            } => {
                let range_value = self.evaluate_expression(range)?;
                let count = range_value.count();

                for index in 0..count {
                    // The induction variable is installed through the
                    // no-copy path; copy-on-write in the symbol slot
                    // protects any shared element instance.
                    let element = range_value.get_value_at_index(index)?;
                    self.symbols
                        .borrow_mut()
                        .set_value_no_copy(*variable_id, element)?;

                    self.execute_statement(body)?;
                    if self.break_flag {
                        self.break_flag = false;
                        break;
                    }
                    if self.next_flag {
                        self.next_flag = false;
                        continue;
                    }
                    if self.return_flag {
                        break;
                    }
                }
                Ok(pool::static_null_invisible())
            }
            Statement::Next { .. } => {
                self.next_flag = true;
                Ok(pool::static_null_invisible())
            }
            Statement::Break { .. } => {
                self.break_flag = true;
                Ok(pool::static_null_invisible())
            }
            Statement::Return { value, .. } => {
                let result = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => pool::static_null(),
                };
                self.return_flag = true;
                self.return_value = Some(result);
                Ok(pool::static_null_invisible())
            }
        }
    }

    fn evaluate_condition(&mut self, condition: &Expression, site_hint: &str) -> EidosResult<bool> {
        let value = self.evaluate_expression(condition)?;
        if value.count() != 1 {
            return Err(EidosError::type_error(
                SITE_EVAL,
                format!(
                    "condition for {} must be a singleton ({} elements supplied).",
                    site_hint,
                    value.count()
                ),
            )
            .with_span(*condition.span()));
        }
        value
            .logical_coerced_at(0)
            .map_err(|e| e.with_span(*condition.span()))
    }

    fn evaluate_expression(&mut self, expr: &Expression) -> EidosResult<ValueRc> {
        let result = match expr {
            Expression::Constant { value, .. } => Ok(Rc::clone(value)),
            Expression::Identifier { id, .. } => self.symbols.borrow().get_value(*id),
            Expression::Unary { op, operand, .. } => {
                let value = self.evaluate_expression(operand)?;
                match op {
                    UnaryOp::Neg => operators::unary_minus(&value),
                    UnaryOp::Plus => operators::unary_plus(&value),
                    UnaryOp::Not => operators::unary_not(&value),
                }
            }
            Expression::Binary {
                op, left, right, ..
            } => {
                let left_value = self.evaluate_expression(left)?;
                let right_value = self.evaluate_expression(right)?;
                operators::binary_op(*op, &left_value, &right_value)
            }
            Expression::Range { start, end, .. } => {
                let start_value = self.evaluate_expression(start)?;
                let end_value = self.evaluate_expression(end)?;
                operators::range(&start_value, &end_value)
            }
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if self.evaluate_condition(condition, "ternary conditional")? {
                    self.evaluate_expression(then_expr)
                } else {
                    self.evaluate_expression(else_expr)
                }
            }
            Expression::Assign { target, value, .. } => self.evaluate_assignment(target, value),
            Expression::Subscript { object, index, .. } => {
                let object_value = self.evaluate_expression(object)?;
                let index_value = self.evaluate_expression(index)?;
                self.evaluate_subscript(&object_value, &index_value)
            }
            Expression::Member {
                object, name, id, ..
            } => {
                let object_value = self.evaluate_expression(object)?;
                self.evaluate_member(&object_value, name, *id)
            }
            Expression::Call { callee, args, .. } => self.evaluate_call(callee, args),
        };

        result.map_err(|e| e.with_span(*expr.span()))
    }

    /// Resolve a subscript index against a value of `count` elements:
    /// logical indices select where true and must match the length; integer
    /// indices select positions, 0-based, negatives disallowed.
    fn selection_indices(
        &self,
        index: &EidosValue,
        count: usize,
    ) -> EidosResult<Vec<usize>> {
        match index.value_type() {
            ValueType::Logical => {
                if index.count() != count {
                    return Err(EidosError::index_out_of_range(
                        SITE_SUBSCRIPT,
                        format!(
                            "logical subscript has {} elements but the operand has {}.",
                            index.count(),
                            count
                        ),
                    ));
                }
                let mut selected = Vec::new();
                for i in 0..count {
                    if index.logical_at(i)? {
                        selected.push(i);
                    }
                }
                Ok(selected)
            }
            ValueType::Integer => {
                let mut selected = Vec::with_capacity(index.count());
                for i in 0..index.count() {
                    let position = index.integer_at(i)?;
                    if position < 0 || position as usize >= count {
                        return Err(EidosError::index_out_of_range(
                            SITE_SUBSCRIPT,
                            format!(
                                "subscript {} is out of range for an operand with {} elements.",
                                position, count
                            ),
                        ));
                    }
                    selected.push(position as usize);
                }
                Ok(selected)
            }
            other => Err(EidosError::type_error(
                SITE_SUBSCRIPT,
                format!("operand type {} is not supported as a subscript index.", other),
            )),
        }
    }

    fn evaluate_subscript(
        &self,
        object: &ValueRc,
        index: &EidosValue,
    ) -> EidosResult<ValueRc> {
        // Subscripting NULL produces NULL, whatever the index.
        if object.is_null() {
            return Ok(pool::static_null());
        }

        let indices = self.selection_indices(index, object.count())?;
        if indices.len() == 1 {
            return object.get_value_at_index(indices[0]);
        }
        Ok(Rc::new(object.select_indices(&indices)?))
    }

    fn evaluate_member(
        &mut self,
        object: &ValueRc,
        name: &Arc<String>,
        id: eidos_core::EidosStringId,
    ) -> EidosResult<ValueRc> {
        if object.value_type() != ValueType::Object {
            return Err(EidosError::type_error(
                SITE_MEMBER,
                format!(
                    "operand type {} is not supported by the '.' operator.",
                    object.value_type()
                ),
            ));
        }

        let class = object
            .object_class()
            .ok_or_else(|| EidosError::internal(SITE_MEMBER, "object value without a class."))?;
        let property = class.property_or_raise(id, name)?;

        let count = object.count();
        if count == 0 {
            return Ok(match property.mask.sole_type() {
                Some(ValueType::Logical) => pool::static_empty_logical(),
                Some(ValueType::Integer) => pool::static_empty_integer(),
                Some(ValueType::Float) => pool::static_empty_float(),
                Some(ValueType::String) => pool::static_empty_string(),
                _ => pool::static_null(),
            });
        }

        if count == 1 {
            let element = object.object_at(0)?;
            return (property.getter)(&element);
        }

        let mut accumulated = EidosValue::null();
        for i in 0..count {
            let element = object.object_at(i)?;
            let piece = (property.getter)(&element)?;
            accumulated.append_from(&piece)?;
        }
        Ok(Rc::new(accumulated))
    }

    fn evaluate_call(&mut self, callee: &Expression, args: &[Argument]) -> EidosResult<ValueRc> {
        match callee {
            Expression::Identifier { name, .. } => {
                let signature = self.function_map.get(name).ok_or_else(|| {
                    EidosError::undefined_identifier(SITE_CALL, Arc::clone(name))
                })?;

                let supplied = self.evaluate_arguments(args)?;
                let matched = signature.match_arguments(supplied)?;

                match &signature.implementation {
                    FunctionImpl::Builtin(body) => body(self, matched),
                    FunctionImpl::Delegate(body) => {
                        let body = Rc::clone(body);
                        body(self, matched)
                    }
                }
            }
            Expression::Member {
                object, name, ..
            } => {
                let receiver = self.evaluate_expression(object)?;
                if receiver.value_type() != ValueType::Object {
                    return Err(EidosError::type_error(
                        SITE_CALL,
                        format!(
                            "method call on an operand of type {}.",
                            receiver.value_type()
                        ),
                    ));
                }
                let class = receiver.object_class().ok_or_else(|| {
                    EidosError::internal(SITE_CALL, "object value without a class.")
                })?;
                let method = class.method_or_raise(name)?.clone();

                let supplied = self.evaluate_arguments(args)?;
                let matched = method.match_arguments(supplied)?;
                (method.body)(&receiver, self, matched)
            }
            _ => Err(EidosError::type_error(
                SITE_CALL,
                "the called expression is not a function or method.",
            )),
        }
    }

    fn evaluate_arguments(
        &mut self,
        args: &[Argument],
    ) -> EidosResult<Vec<(Option<Arc<String>>, ValueRc)>> {
        let mut supplied = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.evaluate_expression(&arg.value)?;
            supplied.push((arg.name.clone(), value));
        }
        Ok(supplied)
    }

    /// Assignment: legal targets are an identifier, a subscript of an
    /// identifier, or a member of an object value. The expression yields an
    /// invisible copy of the assigned value.
    fn evaluate_assignment(
        &mut self,
        target: &Expression,
        value_expr: &Expression,
    ) -> EidosResult<ValueRc> {
        let value = self.evaluate_expression(value_expr)?;

        let mut result = value.copy_values();
        result.set_invisible(true);

        match target {
            Expression::Identifier { id, .. } => {
                self.symbols.borrow_mut().set_value(*id, value)?;
            }
            Expression::Subscript { object, index, .. } => {
                let id = match object.as_ref() {
                    Expression::Identifier { id, .. } => *id,
                    _ => {
                        return Err(EidosError::invalid_assignment_target(
                            SITE_ASSIGN,
                            "subscript assignment requires a simple variable on the left-hand side.",
                        )
                        .with_span(*target.span()));
                    }
                };

                let index_value = self.evaluate_expression(index)?;

                let mut symbols = self.symbols.borrow_mut();
                // Reports redefinition for constants and reifies a unique
                // copy into the slot when the value is shared.
                let stored = symbols.value_mut(id)?;
                let indices = self.selection_indices(&index_value, stored.count())?;

                if value.count() == 1 {
                    for &i in &indices {
                        stored.set_value_at_index(i, &value)?;
                    }
                } else if value.count() == indices.len() {
                    for (j, &i) in indices.iter().enumerate() {
                        let element = value.get_value_at_index(j)?;
                        stored.set_value_at_index(i, &element)?;
                    }
                } else {
                    return Err(EidosError::length_mismatch(
                        SITE_ASSIGN,
                        format!(
                            "assignment into a subscript selecting {} elements from a value with {} elements.",
                            indices.len(),
                            value.count()
                        ),
                    ));
                }
            }
            Expression::Member {
                object, name, id, ..
            } => {
                let receiver = self.evaluate_expression(object)?;
                if receiver.value_type() != ValueType::Object {
                    return Err(EidosError::type_error(
                        SITE_ASSIGN,
                        format!(
                            "operand type {} is not supported by the '.' operator.",
                            receiver.value_type()
                        ),
                    ));
                }
                let class = receiver.object_class().ok_or_else(|| {
                    EidosError::internal(SITE_ASSIGN, "object value without a class.")
                })?;
                let property = class.property_or_raise(*id, name)?;

                let setter = property.setter.as_ref().ok_or_else(|| {
                    EidosError::type_error(
                        SITE_ASSIGN,
                        format!(
                            "property '{}' of class {} is read-only.",
                            name,
                            class.name()
                        ),
                    )
                })?;

                if !property.mask.contains_type(value.value_type()) {
                    return Err(EidosError::type_error(
                        SITE_ASSIGN,
                        format!(
                            "property '{}' of class {} requires {}, but a {} value was supplied.",
                            name,
                            class.name(),
                            property.mask.type_list(),
                            value.value_type()
                        ),
                    ));
                }

                let count = receiver.count();
                if value.count() == 1 {
                    for i in 0..count {
                        let element = receiver.object_at(i)?;
                        setter(&element, &value)?;
                    }
                } else if value.count() == count {
                    for i in 0..count {
                        let element = receiver.object_at(i)?;
                        let piece = value.get_value_at_index(i)?;
                        setter(&element, &piece)?;
                    }
                } else {
                    return Err(EidosError::length_mismatch(
                        SITE_ASSIGN,
                        format!(
                            "property assignment requires one value or one per element ({} supplied for {} elements).",
                            value.count(),
                            count
                        ),
                    ));
                }
            }
            _ => {
                return Err(EidosError::invalid_assignment_target(
                    SITE_ASSIGN,
                    "the left-hand side of an assignment must be an identifier, a subscript of an identifier, or a property.",
                )
                .with_span(*target.span()));
            }
        }

        Ok(Rc::new(result))
    }
}
