//! Translation of Cypher function invocations.
//!
//! Each recognized function maps onto a SQL function call, a column
//! reference, or a cast. Temporal component lookups on temporal
//! function calls (`datetime().epochseconds`) are handled here as
//! well, since they surface as property lookups whose atom is a
//! function call.

use crate::cypher::{self, functions as cypher_functions};
use crate::pgsql::{
    columns, functions, CompoundIdentifier, DataType, Expression, FunctionCall, Identifier,
    Literal, Operator, ProjectionFrom, EPOCH,
};

use super::errors::TranslationError;
use super::expression::{
    as_property_lookup, infer_expression_type, into_property_lookup, type_cast_expression,
};
use super::scope::Binding;
use super::Translator;

fn is_node_binding(data_type: DataType) -> bool {
    matches!(
        data_type,
        DataType::NodeComposite | DataType::ExpansionRootNode | DataType::ExpansionTerminalNode
    )
}

fn is_edge_binding(data_type: DataType) -> bool {
    matches!(data_type, DataType::EdgeComposite | DataType::ExpansionEdge)
}

impl<'a> Translator<'a> {
    pub(crate) fn translate_function_invocation(
        &mut self,
        call: &cypher::FunctionInvocation,
    ) -> Result<(), TranslationError> {
        let name = call.name.to_lowercase();

        if cypher_functions::function_class(&name).is_none() {
            return Err(TranslationError::UnsupportedFunction(call.name.clone()));
        }

        match name.as_str() {
            cypher_functions::COUNT => {
                let parameters = self.translate_arguments(call)?;

                self.tree_translator.push(Expression::FunctionCall(FunctionCall {
                    function: Identifier::from(functions::COUNT),
                    parameters,
                    distinct: call.distinct,
                    cast_type: DataType::Int8,
                }));
                Ok(())
            }

            cypher_functions::DATE => {
                self.translate_temporal_constructor(call, functions::CURRENT_DATE, DataType::Date)
            }

            cypher_functions::TIME => self.translate_temporal_constructor(
                call,
                functions::CURRENT_TIME,
                DataType::TimeWithTimeZone,
            ),

            cypher_functions::LOCAL_TIME => self.translate_temporal_constructor(
                call,
                functions::LOCALTIME,
                DataType::TimeWithoutTimeZone,
            ),

            cypher_functions::DATE_TIME => self.translate_temporal_constructor(
                call,
                functions::NOW,
                DataType::TimestampWithTimeZone,
            ),

            cypher_functions::LOCAL_DATE_TIME => self.translate_temporal_constructor(
                call,
                functions::LOCALTIMESTAMP,
                DataType::TimestampWithoutTimeZone,
            ),

            // No interval representation exists on the SQL side of the
            // model yet
            cypher_functions::DURATION => {
                Err(TranslationError::UnsupportedFunction(call.name.clone()))
            }

            cypher_functions::IDENTITY => {
                let binding = self.entity_binding(call)?;

                if is_node_binding(binding.data_type) || is_edge_binding(binding.data_type) {
                    self.tree_translator.push(Expression::CompoundIdentifier(
                        CompoundIdentifier::column_ref(binding.identifier, columns::ID),
                    ));
                    Ok(())
                } else {
                    Err(TranslationError::InvalidFunctionArgument {
                        function: call.name.clone(),
                    })
                }
            }

            cypher_functions::NODE_LABELS => {
                let binding = self.entity_binding(call)?;

                if is_node_binding(binding.data_type) {
                    self.tree_translator.push(Expression::CompoundIdentifier(
                        CompoundIdentifier::column_ref(binding.identifier, columns::KIND_IDS),
                    ));
                    Ok(())
                } else {
                    Err(TranslationError::InvalidFunctionArgument {
                        function: call.name.clone(),
                    })
                }
            }

            cypher_functions::EDGE_TYPE => {
                let binding = self.entity_binding(call)?;

                if is_edge_binding(binding.data_type) {
                    self.tree_translator.push(Expression::CompoundIdentifier(
                        CompoundIdentifier::column_ref(binding.identifier, columns::KIND_ID),
                    ));
                    Ok(())
                } else {
                    Err(TranslationError::InvalidFunctionArgument {
                        function: call.name.clone(),
                    })
                }
            }

            cypher_functions::TO_LOWER => self.translate_string_function(call, functions::LOWER),

            cypher_functions::TO_UPPER => self.translate_string_function(call, functions::UPPER),

            cypher_functions::STRING_SPLIT_TO_ARRAY => {
                if call.args.len() != 2 {
                    return Err(TranslationError::InvalidFunctionArity {
                        function: call.name.clone(),
                        expected: 2,
                    });
                }

                let parameters = self.translate_arguments(call)?;

                self.tree_translator.push(Expression::FunctionCall(FunctionCall::new(
                    functions::STRING_TO_ARRAY,
                    parameters,
                    DataType::TextArray,
                )));
                Ok(())
            }

            cypher_functions::TO_STRING => {
                let argument = self.translate_single_argument(call)?;
                let casted = type_cast_expression(argument, DataType::Text)?;
                self.tree_translator.push(casted);
                Ok(())
            }

            cypher_functions::TO_INTEGER => {
                let argument = self.translate_single_argument(call)?;
                let casted = type_cast_expression(argument, DataType::Int8)?;
                self.tree_translator.push(casted);
                Ok(())
            }

            cypher_functions::LIST_SIZE => {
                let argument = self.translate_single_argument(call)?;

                let expression = if as_property_lookup(&argument).is_some() {
                    // A list-valued property is counted in place as a
                    // JSON array
                    let mut lookup = into_property_lookup(argument)?;
                    lookup.operator = Operator::JSONField;

                    Expression::FunctionCall(FunctionCall::new(
                        functions::JSONB_ARRAY_LENGTH,
                        vec![Expression::Binary(Box::new(lookup))],
                        DataType::Int4,
                    ))
                } else {
                    let hint = infer_expression_type(&argument)?;

                    if hint == DataType::Text {
                        Expression::FunctionCall(FunctionCall::new(
                            functions::CHAR_LENGTH,
                            vec![argument],
                            DataType::Int4,
                        ))
                    } else {
                        Expression::FunctionCall(FunctionCall::new(
                            functions::ARRAY_LENGTH,
                            vec![argument, Expression::Literal(Literal::int4(1))],
                            DataType::Int4,
                        ))
                    }
                };

                self.tree_translator.push(expression);
                Ok(())
            }

            cypher_functions::COALESCE => {
                if call.args.is_empty() {
                    return Err(TranslationError::InvalidFunctionArity {
                        function: call.name.clone(),
                        expected: 1,
                    });
                }

                let parameters = self.translate_arguments(call)?;

                // Coalesce takes the type of its first typed argument;
                // a fully untyped call is hinted later from whatever it
                // is compared against
                let mut cast_type = DataType::Unknown;

                for parameter in &parameters {
                    let hint = infer_expression_type(parameter)?;

                    if hint.is_known() {
                        cast_type = hint;
                        break;
                    }
                }

                self.tree_translator.push(Expression::FunctionCall(FunctionCall::new(
                    functions::COALESCE,
                    parameters,
                    cast_type,
                )));
                Ok(())
            }

            cypher_functions::COLLECT => {
                let argument = self.translate_single_argument(call)?;
                let member_type = infer_expression_type(&argument)?;
                let cast_type = member_type.to_array_type().unwrap_or(DataType::AnyArray);

                self.tree_translator.push(Expression::FunctionCall(FunctionCall {
                    function: Identifier::from(functions::ARRAY_AGG),
                    parameters: vec![argument],
                    distinct: call.distinct,
                    cast_type,
                }));
                Ok(())
            }

            _ => Err(TranslationError::UnsupportedFunction(call.name.clone())),
        }
    }

    /// Translate a temporal component lookup on a temporal function
    /// call, e.g. `datetime().epochseconds`.
    pub(crate) fn translate_temporal_component(
        &mut self,
        call: FunctionCall,
        component: &str,
    ) -> Result<(), TranslationError> {
        if !matches!(
            call.function.as_str(),
            functions::CURRENT_DATE
                | functions::CURRENT_TIME
                | functions::LOCALTIME
                | functions::LOCALTIMESTAMP
                | functions::NOW
        ) {
            return Err(TranslationError::UnsupportedTemporalComponent {
                component: component.to_string(),
                function: call.function,
            });
        }

        let function = call.function.clone();

        let epoch_extract = Expression::FunctionCall(FunctionCall::new(
            functions::EXTRACT,
            vec![Expression::ProjectionFrom(Box::new(ProjectionFrom {
                projection: vec![Expression::Identifier(Identifier::from(EPOCH))],
                from: vec![Expression::FunctionCall(call)],
            }))],
            DataType::Numeric,
        ));

        match component {
            cypher_functions::ITTC_EPOCH_SECONDS => {
                self.tree_translator.push(epoch_extract);
                Ok(())
            }

            cypher_functions::ITTC_EPOCH_MILLISECONDS => {
                self.tree_translator.push(Expression::binary(
                    epoch_extract,
                    Operator::Multiply,
                    Expression::Literal(Literal::int4(1000)),
                ));
                Ok(())
            }

            _ => Err(TranslationError::UnsupportedTemporalComponent {
                component: component.to_string(),
                function,
            }),
        }
    }

    fn translate_temporal_constructor(
        &mut self,
        call: &cypher::FunctionInvocation,
        function_name: &str,
        data_type: DataType,
    ) -> Result<(), TranslationError> {
        match call.args.len() {
            0 => {
                self.tree_translator.push(Expression::FunctionCall(FunctionCall::new(
                    function_name,
                    Vec::new(),
                    data_type,
                )));
                Ok(())
            }

            1 => {
                let argument = self.translate_single_argument(call)?;
                let casted = type_cast_expression(argument, data_type)?;
                self.tree_translator.push(casted);
                Ok(())
            }

            _ => Err(TranslationError::InvalidFunctionArity {
                function: call.name.clone(),
                expected: 1,
            }),
        }
    }

    fn translate_string_function(
        &mut self,
        call: &cypher::FunctionInvocation,
        function_name: &str,
    ) -> Result<(), TranslationError> {
        let argument = self.translate_single_argument(call)?;

        self.tree_translator.push(Expression::FunctionCall(FunctionCall::new(
            function_name,
            vec![argument],
            DataType::Text,
        )));
        Ok(())
    }

    fn translate_arguments(
        &mut self,
        call: &cypher::FunctionInvocation,
    ) -> Result<Vec<Expression>, TranslationError> {
        for argument in &call.args {
            self.walk(argument)?;
        }

        let mut parameters = Vec::with_capacity(call.args.len());

        for _ in 0..call.args.len() {
            parameters.push(self.tree_translator.pop()?);
        }

        parameters.reverse();
        Ok(parameters)
    }

    fn translate_single_argument(
        &mut self,
        call: &cypher::FunctionInvocation,
    ) -> Result<Expression, TranslationError> {
        if call.args.len() != 1 {
            return Err(TranslationError::InvalidFunctionArity {
                function: call.name.clone(),
                expected: 1,
            });
        }

        self.walk(&call.args[0])?;
        self.tree_translator.pop()
    }

    fn entity_binding(
        &mut self,
        call: &cypher::FunctionInvocation,
    ) -> Result<Binding, TranslationError> {
        match call.args.as_slice() {
            [cypher::Expression::Variable(symbol)] => self
                .scope
                .lookup_string(symbol)
                .cloned()
                .ok_or_else(|| TranslationError::UnboundIdentifier(symbol.clone())),

            _ => Err(TranslationError::InvalidFunctionArgument {
                function: call.name.clone(),
            }),
        }
    }
}
