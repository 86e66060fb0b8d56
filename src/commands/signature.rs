//! Command signatures and the matcher binding typed tokens to their slots.

use std::collections::BTreeSet;

use super::error::{MatchError, RegistrationError};
use crate::parse::Token;
use crate::types::{Capability, ChannelId, GlobalFlag, MemberId, Quote, TypeTag, Value, ValueKind};

/// Names, required capability and help of a named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub names: Vec<String>,
    pub capability: Capability,
    pub help: String,
}

impl FlagSpec {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            capability: Capability::default(),
            help: String::new(),
        }
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// A declared parameter, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub tag: TypeTag,
    pub mandatory: bool,
    pub flag: Option<FlagSpec>,
}

impl Parameter {
    pub fn mandatory(tag: TypeTag) -> Self {
        Self {
            tag,
            mandatory: true,
            flag: None,
        }
    }

    pub fn optional(tag: TypeTag) -> Self {
        Self {
            tag,
            mandatory: false,
            flag: None,
        }
    }

    /// A named parameter. Named parameters are always optional.
    pub fn named(tag: TypeTag, flag: FlagSpec) -> Self {
        Self {
            tag,
            mandatory: false,
            flag: Some(flag),
        }
    }
}

/// One validated parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSlot {
    pub tag: TypeTag,
    pub mandatory: bool,
}

/// The values bound to a signature's slots, plus the global flags present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub values: Vec<Option<Value>>,
    pub global_flags: BTreeSet<GlobalFlag>,
}

impl Arguments {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)?.as_ref()
    }

    pub fn integer(&self, slot: usize) -> Option<i64> {
        self.get(slot)?.as_integer()
    }

    pub fn real(&self, slot: usize) -> Option<f64> {
        self.get(slot)?.as_real()
    }

    pub fn boolean(&self, slot: usize) -> Option<bool> {
        self.get(slot)?.as_bool()
    }

    pub fn member(&self, slot: usize) -> Option<MemberId> {
        self.get(slot)?.as_member()
    }

    pub fn channel(&self, slot: usize) -> Option<ChannelId> {
        self.get(slot)?.as_channel()
    }

    pub fn quote(&self, slot: usize) -> Option<&Quote> {
        self.get(slot)?.as_quote()
    }

    pub fn text(&self, slot: usize) -> Option<&str> {
        self.get(slot)?.as_text()
    }

    pub fn has_flag(&self, flag: GlobalFlag) -> bool {
        self.global_flags.contains(&flag)
    }
}

pub type MatchResult = Result<Arguments, MatchError>;

/// Splits global flag tokens from the rest, keeping original indexes on both
/// sides. Running it again on the remainder finds nothing.
pub fn extract_global_flags<'t, I>(tokens: I) -> (Vec<(GlobalFlag, usize)>, Vec<(usize, &'t Token)>)
where
    I: IntoIterator<Item = (usize, &'t Token)>,
{
    let mut globals = Vec::new();
    let mut rest = Vec::new();
    for (index, token) in tokens {
        match token.named().and_then(|named| GlobalFlag::from_name(&named.name)) {
            Some(flag) => globals.push((flag, index)),
            None => rest.push((index, token)),
        }
    }
    (globals, rest)
}

/// The parameter list of a command: mandatory slots, then optional ones,
/// some of them reachable by `--name`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSignature {
    slots: Vec<ParameterSlot>,
    mandatory_count: usize,
    flags: Vec<(FlagSpec, usize)>,
    global_flags: BTreeSet<GlobalFlag>,
}

impl CommandSignature {
    pub fn new(
        parameters: Vec<Parameter>,
        global_flags: impl IntoIterator<Item = GlobalFlag>,
    ) -> Result<Self, RegistrationError> {
        let mut slots = Vec::with_capacity(parameters.len());
        let mut flags = Vec::new();
        let mut mandatory_count = 0;
        let mut optional_seen = false;

        for (index, parameter) in parameters.into_iter().enumerate() {
            if parameter.mandatory {
                if optional_seen {
                    return Err(RegistrationError::OptionalBeforeMandatory { index });
                }
                mandatory_count += 1;
            } else {
                optional_seen = true;
            }

            match (parameter.tag.is_named(), parameter.flag) {
                (true, Some(flag)) if !flag.names.is_empty() => flags.push((flag, index)),
                (true, _) => return Err(RegistrationError::MissingFlagMetadata { index }),
                (false, Some(_)) => {
                    return Err(RegistrationError::FlagOnPlainParameter {
                        index,
                        tag: parameter.tag,
                    });
                }
                (false, None) => {}
            }

            slots.push(ParameterSlot {
                tag: parameter.tag,
                mandatory: parameter.mandatory,
            });
        }

        Ok(Self {
            slots,
            mandatory_count,
            flags,
            global_flags: global_flags.into_iter().collect(),
        })
    }

    pub fn slots(&self) -> &[ParameterSlot] {
        &self.slots
    }

    pub fn mandatory(&self) -> &[ParameterSlot] {
        &self.slots[..self.mandatory_count]
    }

    pub fn optional(&self) -> &[ParameterSlot] {
        &self.slots[self.mandatory_count..]
    }

    pub fn flags(&self) -> impl Iterator<Item = (&FlagSpec, usize)> {
        self.flags.iter().map(|(flag, slot)| (flag, *slot))
    }

    pub fn flag_for(&self, name: &str) -> Option<(&FlagSpec, usize)> {
        self.flags().find(|(flag, _)| flag.matches(name))
    }

    pub fn global_flags(&self) -> &BTreeSet<GlobalFlag> {
        &self.global_flags
    }

    pub fn accepts(&self, flag: GlobalFlag) -> bool {
        self.global_flags.contains(&flag)
    }

    /// Names of the named-boolean flags of this signature.
    pub fn boolean_flag_names(&self) -> impl Iterator<Item = &str> {
        self.flags()
            .filter(|(_, slot)| self.slots[*slot].tag == TypeTag::named(ValueKind::Boolean))
            .flat_map(|(flag, _)| flag.names.iter().map(String::as_str))
    }

    /// Binds `tokens` to the slots.
    ///
    /// Positional tokens fill slots left to right; an optional slot whose type
    /// does not match is left empty. A named token fills the slot of its flag
    /// wherever it appears and the positional walk later skips that slot.
    /// `permits` tells whether the caller holds a flag's capability.
    pub fn match_tokens(
        &self,
        tokens: &[Token],
        permits: &dyn Fn(&Capability) -> bool,
    ) -> MatchResult {
        let (globals, rest) = extract_global_flags(tokens.iter().enumerate());

        let mut values: Vec<Option<Value>> = vec![None; self.slots.len()];
        let mut filled = BTreeSet::new();
        let mut i = 0;
        let mut j = 0;

        while i < self.slots.len() && j < rest.len() {
            if filled.remove(&i) {
                i += 1;
                continue;
            }

            let (index, token) = rest[j];

            if let Some(named) = token.named() {
                let (flag, slot) = self
                    .flag_for(&named.name)
                    .ok_or_else(|| MatchError::FlagDoesNotExist {
                        index,
                        name: named.name.clone(),
                    })?;
                let expected = self.slots[slot].tag;
                if token.tag != expected {
                    return Err(MatchError::WrongType {
                        index,
                        flag: named.name.clone(),
                        expected,
                        found: token.tag,
                    });
                }
                if !permits(&flag.capability) {
                    return Err(MatchError::PermissionDenied {
                        index,
                        flags: flag.names.clone(),
                        capability: flag.capability.clone(),
                    });
                }
                values[slot] = Some(token.value.clone());
                filled.insert(slot);
                j += 1;
                continue;
            }

            let slot = self.slots[i];
            if token.tag == slot.tag {
                values[i] = Some(token.value.clone());
                j += 1;
            } else if slot.mandatory {
                return Err(MatchError::TypeMismatch {
                    index,
                    expected: slot.tag,
                    found: token.tag,
                });
            }
            i += 1;
        }

        if let Some((flag, index)) = globals.iter().find(|(flag, _)| !self.accepts(*flag)) {
            return Err(MatchError::GlobalFlagNotAccepted {
                index: *index,
                flag: *flag,
            });
        }

        if i < self.mandatory_count {
            return Err(MatchError::IncompleteCall {
                missing: self.mandatory_count - i,
                expected: self.slots[i..self.mandatory_count].iter().map(|s| s.tag).collect(),
            });
        }

        if let Some((index, _)) = rest.get(j) {
            return Err(MatchError::TooManyArguments { index: *index });
        }

        Ok(Arguments {
            values,
            global_flags: globals.into_iter().map(|(flag, _)| flag).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::parse::{ArgumentStream, InterpreterRegistry, TrustingLookup};

    fn tokens(input: &str) -> Vec<Token> {
        let stream = ArgumentStream::split(input, " ", &TrustingLookup);
        InterpreterRegistry::default().tokenize(&stream)
    }

    fn allow_all(_: &Capability) -> bool {
        true
    }

    fn int_with_x() -> CommandSignature {
        CommandSignature::new(
            vec![
                Parameter::mandatory(TypeTag::INTEGER),
                Parameter::named(TypeTag::named(ValueKind::Integer), FlagSpec::new(["x", "ex"])),
            ],
            [GlobalFlag::AutoDelete],
        )
        .unwrap()
    }

    #[test]
    fn test_positional_binding() {
        let signature = int_with_x();
        let args = signature.match_tokens(&tokens("7"), &allow_all).unwrap();
        assert_eq!(args.values, vec![Some(Value::Integer(7)), None]);
    }

    #[test]
    fn test_out_of_order_named_binding() {
        let signature = int_with_x();
        let args = signature.match_tokens(&tokens("--x 5 7"), &allow_all).unwrap();
        assert_eq!(args.integer(0), Some(7));
        assert_eq!(args.integer(1), Some(5));

        let args = signature.match_tokens(&tokens("7 --ex 5"), &allow_all).unwrap();
        assert_eq!(args.integer(0), Some(7));
        assert_eq!(args.integer(1), Some(5));
    }

    #[test]
    fn test_incomplete_call_counts_missing() {
        let signature = CommandSignature::new(
            vec![
                Parameter::mandatory(TypeTag::INTEGER),
                Parameter::mandatory(TypeTag::INTEGER),
                Parameter::mandatory(TypeTag::TEXT),
            ],
            [],
        )
        .unwrap();
        let error = signature.match_tokens(&tokens("1"), &allow_all).unwrap_err();
        assert_eq!(
            error,
            MatchError::IncompleteCall {
                missing: 2,
                expected: vec![TypeTag::INTEGER, TypeTag::TEXT],
            }
        );
    }

    #[test]
    fn test_optional_slot_mismatch_is_skipped() {
        let signature = CommandSignature::new(
            vec![
                Parameter::mandatory(TypeTag::TEXT),
                Parameter::optional(TypeTag::INTEGER),
                Parameter::optional(TypeTag::BOOLEAN),
            ],
            [],
        )
        .unwrap();
        let args = signature.match_tokens(&tokens("a true"), &allow_all).unwrap();
        assert_eq!(args.text(0), Some("a"));
        assert_eq!(args.get(1), None);
        assert_eq!(args.boolean(2), Some(true));
    }

    #[test]
    fn test_type_mismatch_on_mandatory() {
        let error = int_with_x().match_tokens(&tokens("hello"), &allow_all).unwrap_err();
        assert_eq!(
            error,
            MatchError::TypeMismatch {
                index: 0,
                expected: TypeTag::INTEGER,
                found: TypeTag::TEXT,
            }
        );
    }

    #[test]
    fn test_unknown_flag() {
        let error = int_with_x().match_tokens(&tokens("1 --y 2"), &allow_all).unwrap_err();
        assert_eq!(
            error,
            MatchError::FlagDoesNotExist {
                index: 1,
                name: "y".to_string(),
            }
        );
    }

    #[test]
    fn test_flag_value_of_wrong_type() {
        let error = int_with_x().match_tokens(&tokens("1 --x hello"), &allow_all).unwrap_err();
        assert!(matches!(error, MatchError::WrongType { index: 1, ref flag, .. } if flag == "x"));
    }

    #[test]
    fn test_permission_denied() {
        let signature = CommandSignature::new(
            vec![Parameter::named(
                TypeTag::named(ValueKind::Integer),
                FlagSpec::new(["x"]).capability(Capability::ADMINISTRATOR),
            )],
            [],
        )
        .unwrap();
        let deny_admin = |capability: &Capability| *capability != Capability::ADMINISTRATOR;
        let error = signature.match_tokens(&tokens("--x 1"), &deny_admin).unwrap_err();
        assert_eq!(
            error,
            MatchError::PermissionDenied {
                index: 0,
                flags: vec!["x".to_string()],
                capability: Capability::ADMINISTRATOR,
            }
        );
    }

    #[test]
    fn test_global_flags_are_extracted() {
        let args = int_with_x().match_tokens(&tokens("--autodelete 3"), &allow_all).unwrap();
        assert_eq!(args.integer(0), Some(3));
        assert!(args.has_flag(GlobalFlag::AutoDelete));
    }

    #[test]
    fn test_global_flag_not_accepted_uses_original_index() {
        let signature =
            CommandSignature::new(vec![Parameter::mandatory(TypeTag::INTEGER)], []).unwrap();
        let error = signature.match_tokens(&tokens("3 --autodelete"), &allow_all).unwrap_err();
        assert_eq!(
            error,
            MatchError::GlobalFlagNotAccepted {
                index: 1,
                flag: GlobalFlag::AutoDelete,
            }
        );
    }

    #[test]
    fn test_too_many_arguments_uses_original_index() {
        let error = int_with_x().match_tokens(&tokens("--autodelete 1 2"), &allow_all).unwrap_err();
        assert_eq!(error, MatchError::TooManyArguments { index: 2 });
    }

    #[test]
    fn test_named_flag_after_its_slot_was_passed() {
        let signature = CommandSignature::new(
            vec![
                Parameter::mandatory(TypeTag::INTEGER),
                Parameter::named(TypeTag::named(ValueKind::Integer), FlagSpec::new(["x"])),
                Parameter::optional(TypeTag::TEXT),
            ],
            [],
        )
        .unwrap();
        let args = signature.match_tokens(&tokens("1 --x 2 word"), &allow_all).unwrap();
        assert_eq!(args.integer(1), Some(2));
        assert_eq!(args.text(2), Some("word"));
    }

    #[test]
    fn test_boolean_flag_names() {
        let signature = CommandSignature::new(
            vec![
                Parameter::named(TypeTag::named(ValueKind::Boolean), FlagSpec::new(["loud", "l"])),
                Parameter::named(TypeTag::named(ValueKind::Integer), FlagSpec::new(["repeat"])),
            ],
            [],
        )
        .unwrap();
        let names: Vec<&str> = signature.boolean_flag_names().collect();
        assert_eq!(names, vec!["loud", "l"]);
    }

    #[test]
    fn test_named_parameter_needs_flag_names() {
        let error = CommandSignature::new(
            vec![Parameter::named(
                TypeTag::named(ValueKind::Integer),
                FlagSpec::new(Vec::<String>::new()),
            )],
            [],
        )
        .unwrap_err();
        assert!(matches!(error, RegistrationError::MissingFlagMetadata { index: 0 }));

        let unflagged = Parameter::optional(TypeTag::named(ValueKind::Integer));
        let error = CommandSignature::new(vec![unflagged], []).unwrap_err();
        assert!(matches!(error, RegistrationError::MissingFlagMetadata { index: 0 }));

        let plain = Parameter::named(TypeTag::INTEGER, FlagSpec::new(["x"]));
        let error = CommandSignature::new(vec![plain], []).unwrap_err();
        assert!(matches!(error, RegistrationError::FlagOnPlainParameter { index: 0, .. }));
    }

    proptest! {
        #[test]
        fn mandatory_must_precede_optional(pattern in prop::collection::vec(any::<bool>(), 0..8)) {
            let parameters: Vec<Parameter> = pattern
                .iter()
                .map(|mandatory| if *mandatory {
                    Parameter::mandatory(TypeTag::INTEGER)
                } else {
                    Parameter::optional(TypeTag::INTEGER)
                })
                .collect();
            let well_ordered = pattern.windows(2).all(|pair| pair[0] || !pair[1]);

            match CommandSignature::new(parameters, []) {
                Ok(signature) => {
                    prop_assert!(well_ordered);
                    let mandatory = pattern.iter().filter(|m| **m).count();
                    prop_assert_eq!(signature.mandatory().len(), mandatory);
                    prop_assert!(signature.mandatory().iter().all(|s| s.mandatory));
                    prop_assert!(signature.optional().iter().all(|s| !s.mandatory));
                }
                Err(error) => {
                    prop_assert!(!well_ordered);
                    let is_ordering_error =
                        matches!(error, RegistrationError::OptionalBeforeMandatory { .. });
                    prop_assert!(is_ordering_error);
                }
            }
        }

        #[test]
        fn global_flag_extraction_is_idempotent(words in prop::collection::vec(
            prop_oneof!["--autodelete", "--help", "--[a-z]{1,4}", "[0-9]{1,3}", "[a-z]{1,4}"],
            0..8,
        )) {
            let tokens = tokens(&words.join(" "));
            let (globals, rest) = extract_global_flags(tokens.iter().enumerate());
            let (again, rest_again) = extract_global_flags(rest.clone());
            prop_assert!(again.is_empty());
            prop_assert_eq!(rest_again, rest.clone());
            prop_assert_eq!(globals.len() + rest.len(), tokens.len());
        }
    }
}
