//! Dalvik opcodes understood by the instruction model.
//!
//! Every opcode defined for dex files up to version 039 is listed, so any
//! disassembled method body can be loaded. Each opcode carries its operand
//! [`Format`] and the kind of reference it loads, which is all the template
//! assembler and the method walker need.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Operand layout of an instruction, as written in smali.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `nop`, `return-void`
    NoRegisters,
    /// `move-result v0`
    OneRegister,
    /// `move v0, v1`
    TwoRegisters,
    /// `add-int v0, v1, v2`
    ThreeRegisters,
    /// `const/4 v0, 0x1`
    RegisterLiteral,
    /// `add-int/lit8 v0, v1, 0x1`
    TwoRegistersLiteral,
    /// `const-string v0, "text"`, `sget-object v0, La;->b:Lc;`
    RegisterReference,
    /// `iget-object v0, p0, La;->b:Lc;`
    TwoRegistersReference,
    /// `invoke-static {v0, v1}, La;->b(II)V`
    RegisterList,
    /// `invoke-static/range {v0 .. v5}, La;->b(IIIIII)V`
    RegisterRange,
    /// `invoke-polymorphic {v0, v1}, La;->invoke([Ljava/lang/Object;)Ljava/lang/Object;, (I)V`
    RegisterListPrototype,
    /// `invoke-polymorphic/range {v0 .. v2}, La;->invoke([Ljava/lang/Object;)Ljava/lang/Object;, (II)V`
    RegisterRangePrototype,
    /// `goto :label`
    Branch,
    /// `if-eqz v0, :label`
    RegisterBranch,
    /// `if-eq v0, v1, :label`
    TwoRegistersBranch,
    /// `fill-array-data v0, :array_0`
    RegisterPayload,
}

/// What a reference operand points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ReferenceKind {
    Method,
    Field,
    Type,
    String,
    MethodHandle,
    MethodType,
    CallSite,
}
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, FromRepr, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Move = 0x01,
    #[strum(serialize = "move/from16")]
    MoveFrom16 = 0x02,
    #[strum(serialize = "move/16")]
    Move16 = 0x03,
    MoveWide = 0x04,
    #[strum(serialize = "move-wide/from16")]
    MoveWideFrom16 = 0x05,
    #[strum(serialize = "move-wide/16")]
    MoveWide16 = 0x06,
    MoveObject = 0x07,
    #[strum(serialize = "move-object/from16")]
    MoveObjectFrom16 = 0x08,
    #[strum(serialize = "move-object/16")]
    MoveObject16 = 0x09,
    MoveResult = 0x0a,
    MoveResultWide = 0x0b,
    MoveResultObject = 0x0c,
    MoveException = 0x0d,
    ReturnVoid = 0x0e,
    Return = 0x0f,
    ReturnWide = 0x10,
    ReturnObject = 0x11,
    #[strum(serialize = "const/4")]
    Const4 = 0x12,
    #[strum(serialize = "const/16")]
    Const16 = 0x13,
    Const = 0x14,
    #[strum(serialize = "const/high16")]
    ConstHigh16 = 0x15,
    #[strum(serialize = "const-wide/16")]
    ConstWide16 = 0x16,
    #[strum(serialize = "const-wide/32")]
    ConstWide32 = 0x17,
    ConstWide = 0x18,
    #[strum(serialize = "const-wide/high16")]
    ConstWideHigh16 = 0x19,
    ConstString = 0x1a,
    #[strum(serialize = "const-string/jumbo")]
    ConstStringJumbo = 0x1b,
    ConstClass = 0x1c,
    MonitorEnter = 0x1d,
    MonitorExit = 0x1e,
    CheckCast = 0x1f,
    InstanceOf = 0x20,
    ArrayLength = 0x21,
    NewInstance = 0x22,
    NewArray = 0x23,
    FilledNewArray = 0x24,
    #[strum(serialize = "filled-new-array/range")]
    FilledNewArrayRange = 0x25,
    FillArrayData = 0x26,
    Throw = 0x27,
    Goto = 0x28,
    #[strum(serialize = "goto/16")]
    Goto16 = 0x29,
    #[strum(serialize = "goto/32")]
    Goto32 = 0x2a,
    PackedSwitch = 0x2b,
    SparseSwitch = 0x2c,
    CmplFloat = 0x2d,
    CmpgFloat = 0x2e,
    CmplDouble = 0x2f,
    CmpgDouble = 0x30,
    CmpLong = 0x31,
    IfEq = 0x32,
    IfNe = 0x33,
    IfLt = 0x34,
    IfGe = 0x35,
    IfGt = 0x36,
    IfLe = 0x37,
    IfEqz = 0x38,
    IfNez = 0x39,
    IfLtz = 0x3a,
    IfGez = 0x3b,
    IfGtz = 0x3c,
    IfLez = 0x3d,
    Aget = 0x44,
    AgetWide = 0x45,
    AgetObject = 0x46,
    AgetBoolean = 0x47,
    AgetByte = 0x48,
    AgetChar = 0x49,
    AgetShort = 0x4a,
    Aput = 0x4b,
    AputWide = 0x4c,
    AputObject = 0x4d,
    AputBoolean = 0x4e,
    AputByte = 0x4f,
    AputChar = 0x50,
    AputShort = 0x51,
    Iget = 0x52,
    IgetWide = 0x53,
    IgetObject = 0x54,
    IgetBoolean = 0x55,
    IgetByte = 0x56,
    IgetChar = 0x57,
    IgetShort = 0x58,
    Iput = 0x59,
    IputWide = 0x5a,
    IputObject = 0x5b,
    IputBoolean = 0x5c,
    IputByte = 0x5d,
    IputChar = 0x5e,
    IputShort = 0x5f,
    Sget = 0x60,
    SgetWide = 0x61,
    SgetObject = 0x62,
    SgetBoolean = 0x63,
    SgetByte = 0x64,
    SgetChar = 0x65,
    SgetShort = 0x66,
    Sput = 0x67,
    SputWide = 0x68,
    SputObject = 0x69,
    SputBoolean = 0x6a,
    SputByte = 0x6b,
    SputChar = 0x6c,
    SputShort = 0x6d,
    InvokeVirtual = 0x6e,
    InvokeSuper = 0x6f,
    InvokeDirect = 0x70,
    InvokeStatic = 0x71,
    InvokeInterface = 0x72,
    #[strum(serialize = "invoke-virtual/range")]
    InvokeVirtualRange = 0x74,
    #[strum(serialize = "invoke-super/range")]
    InvokeSuperRange = 0x75,
    #[strum(serialize = "invoke-direct/range")]
    InvokeDirectRange = 0x76,
    #[strum(serialize = "invoke-static/range")]
    InvokeStaticRange = 0x77,
    #[strum(serialize = "invoke-interface/range")]
    InvokeInterfaceRange = 0x78,
    NegInt = 0x7b,
    NotInt = 0x7c,
    NegLong = 0x7d,
    NotLong = 0x7e,
    NegFloat = 0x7f,
    NegDouble = 0x80,
    IntToLong = 0x81,
    IntToFloat = 0x82,
    IntToDouble = 0x83,
    LongToInt = 0x84,
    LongToFloat = 0x85,
    LongToDouble = 0x86,
    FloatToInt = 0x87,
    FloatToLong = 0x88,
    FloatToDouble = 0x89,
    DoubleToInt = 0x8a,
    DoubleToLong = 0x8b,
    DoubleToFloat = 0x8c,
    IntToByte = 0x8d,
    IntToChar = 0x8e,
    IntToShort = 0x8f,
    AddInt = 0x90,
    SubInt = 0x91,
    MulInt = 0x92,
    DivInt = 0x93,
    RemInt = 0x94,
    AndInt = 0x95,
    OrInt = 0x96,
    XorInt = 0x97,
    ShlInt = 0x98,
    ShrInt = 0x99,
    UshrInt = 0x9a,
    AddLong = 0x9b,
    SubLong = 0x9c,
    MulLong = 0x9d,
    DivLong = 0x9e,
    RemLong = 0x9f,
    AndLong = 0xa0,
    OrLong = 0xa1,
    XorLong = 0xa2,
    ShlLong = 0xa3,
    ShrLong = 0xa4,
    UshrLong = 0xa5,
    AddFloat = 0xa6,
    SubFloat = 0xa7,
    MulFloat = 0xa8,
    DivFloat = 0xa9,
    RemFloat = 0xaa,
    AddDouble = 0xab,
    SubDouble = 0xac,
    MulDouble = 0xad,
    DivDouble = 0xae,
    RemDouble = 0xaf,
    #[strum(serialize = "add-int/2addr")]
    AddInt2addr = 0xb0,
    #[strum(serialize = "sub-int/2addr")]
    SubInt2addr = 0xb1,
    #[strum(serialize = "mul-int/2addr")]
    MulInt2addr = 0xb2,
    #[strum(serialize = "div-int/2addr")]
    DivInt2addr = 0xb3,
    #[strum(serialize = "rem-int/2addr")]
    RemInt2addr = 0xb4,
    #[strum(serialize = "and-int/2addr")]
    AndInt2addr = 0xb5,
    #[strum(serialize = "or-int/2addr")]
    OrInt2addr = 0xb6,
    #[strum(serialize = "xor-int/2addr")]
    XorInt2addr = 0xb7,
    #[strum(serialize = "shl-int/2addr")]
    ShlInt2addr = 0xb8,
    #[strum(serialize = "shr-int/2addr")]
    ShrInt2addr = 0xb9,
    #[strum(serialize = "ushr-int/2addr")]
    UshrInt2addr = 0xba,
    #[strum(serialize = "add-long/2addr")]
    AddLong2addr = 0xbb,
    #[strum(serialize = "sub-long/2addr")]
    SubLong2addr = 0xbc,
    #[strum(serialize = "mul-long/2addr")]
    MulLong2addr = 0xbd,
    #[strum(serialize = "div-long/2addr")]
    DivLong2addr = 0xbe,
    #[strum(serialize = "rem-long/2addr")]
    RemLong2addr = 0xbf,
    #[strum(serialize = "and-long/2addr")]
    AndLong2addr = 0xc0,
    #[strum(serialize = "or-long/2addr")]
    OrLong2addr = 0xc1,
    #[strum(serialize = "xor-long/2addr")]
    XorLong2addr = 0xc2,
    #[strum(serialize = "shl-long/2addr")]
    ShlLong2addr = 0xc3,
    #[strum(serialize = "shr-long/2addr")]
    ShrLong2addr = 0xc4,
    #[strum(serialize = "ushr-long/2addr")]
    UshrLong2addr = 0xc5,
    #[strum(serialize = "add-float/2addr")]
    AddFloat2addr = 0xc6,
    #[strum(serialize = "sub-float/2addr")]
    SubFloat2addr = 0xc7,
    #[strum(serialize = "mul-float/2addr")]
    MulFloat2addr = 0xc8,
    #[strum(serialize = "div-float/2addr")]
    DivFloat2addr = 0xc9,
    #[strum(serialize = "rem-float/2addr")]
    RemFloat2addr = 0xca,
    #[strum(serialize = "add-double/2addr")]
    AddDouble2addr = 0xcb,
    #[strum(serialize = "sub-double/2addr")]
    SubDouble2addr = 0xcc,
    #[strum(serialize = "mul-double/2addr")]
    MulDouble2addr = 0xcd,
    #[strum(serialize = "div-double/2addr")]
    DivDouble2addr = 0xce,
    #[strum(serialize = "rem-double/2addr")]
    RemDouble2addr = 0xcf,
    #[strum(serialize = "add-int/lit16")]
    AddIntLit16 = 0xd0,
    RsubInt = 0xd1,
    #[strum(serialize = "mul-int/lit16")]
    MulIntLit16 = 0xd2,
    #[strum(serialize = "div-int/lit16")]
    DivIntLit16 = 0xd3,
    #[strum(serialize = "rem-int/lit16")]
    RemIntLit16 = 0xd4,
    #[strum(serialize = "and-int/lit16")]
    AndIntLit16 = 0xd5,
    #[strum(serialize = "or-int/lit16")]
    OrIntLit16 = 0xd6,
    #[strum(serialize = "xor-int/lit16")]
    XorIntLit16 = 0xd7,
    #[strum(serialize = "add-int/lit8")]
    AddIntLit8 = 0xd8,
    #[strum(serialize = "rsub-int/lit8")]
    RsubIntLit8 = 0xd9,
    #[strum(serialize = "mul-int/lit8")]
    MulIntLit8 = 0xda,
    #[strum(serialize = "div-int/lit8")]
    DivIntLit8 = 0xdb,
    #[strum(serialize = "rem-int/lit8")]
    RemIntLit8 = 0xdc,
    #[strum(serialize = "and-int/lit8")]
    AndIntLit8 = 0xdd,
    #[strum(serialize = "or-int/lit8")]
    OrIntLit8 = 0xde,
    #[strum(serialize = "xor-int/lit8")]
    XorIntLit8 = 0xdf,
    #[strum(serialize = "shl-int/lit8")]
    ShlIntLit8 = 0xe0,
    #[strum(serialize = "shr-int/lit8")]
    ShrIntLit8 = 0xe1,
    #[strum(serialize = "ushr-int/lit8")]
    UshrIntLit8 = 0xe2,
    InvokePolymorphic = 0xfa,
    #[strum(serialize = "invoke-polymorphic/range")]
    InvokePolymorphicRange = 0xfb,
    InvokeCustom = 0xfc,
    #[strum(serialize = "invoke-custom/range")]
    InvokeCustomRange = 0xfd,
    ConstMethodHandle = 0xfe,
    ConstMethodType = 0xff,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }

    /// Smali mnemonic, e.g. `invoke-static/range`
    pub fn mnemonic(&self) -> &'static str {
        self.into()
    }

    pub fn format(&self) -> Format {
        use Opcode::*;
        match self {
            Nop | ReturnVoid => Format::NoRegisters,

            MoveResult | MoveResultWide | MoveResultObject | MoveException | Return
            | ReturnWide | ReturnObject | MonitorEnter | MonitorExit | Throw => Format::OneRegister,

            Move | MoveFrom16 | Move16 | MoveWide | MoveWideFrom16 | MoveWide16 | MoveObject
            | MoveObjectFrom16 | MoveObject16 | ArrayLength => Format::TwoRegisters,
            NegInt | NotInt | NegLong | NotLong | NegFloat | NegDouble | IntToLong
            | IntToFloat | IntToDouble | LongToInt | LongToFloat | LongToDouble | FloatToInt
            | FloatToLong | FloatToDouble | DoubleToInt | DoubleToLong | DoubleToFloat
            | IntToByte | IntToChar | IntToShort => Format::TwoRegisters,
            AddInt2addr | SubInt2addr | MulInt2addr | DivInt2addr | RemInt2addr | AndInt2addr
            | OrInt2addr | XorInt2addr | ShlInt2addr | ShrInt2addr | UshrInt2addr
            | AddLong2addr | SubLong2addr | MulLong2addr | DivLong2addr | RemLong2addr
            | AndLong2addr | OrLong2addr | XorLong2addr | ShlLong2addr | ShrLong2addr
            | UshrLong2addr | AddFloat2addr | SubFloat2addr | MulFloat2addr | DivFloat2addr
            | RemFloat2addr | AddDouble2addr | SubDouble2addr | MulDouble2addr
            | DivDouble2addr | RemDouble2addr => Format::TwoRegisters,

            CmplFloat | CmpgFloat | CmplDouble | CmpgDouble | CmpLong => Format::ThreeRegisters,
            Aget | AgetWide | AgetObject | AgetBoolean | AgetByte | AgetChar | AgetShort | Aput
            | AputWide | AputObject | AputBoolean | AputByte | AputChar | AputShort => {
                Format::ThreeRegisters
            }
            AddInt | SubInt | MulInt | DivInt | RemInt | AndInt | OrInt | XorInt | ShlInt
            | ShrInt | UshrInt | AddLong | SubLong | MulLong | DivLong | RemLong | AndLong
            | OrLong | XorLong | ShlLong | ShrLong | UshrLong | AddFloat | SubFloat | MulFloat
            | DivFloat | RemFloat | AddDouble | SubDouble | MulDouble | DivDouble | RemDouble => {
                Format::ThreeRegisters
            }

            Const4 | Const16 | Const | ConstHigh16 | ConstWide16 | ConstWide32 | ConstWide
            | ConstWideHigh16 => Format::RegisterLiteral,
            AddIntLit16 | RsubInt | MulIntLit16 | DivIntLit16 | RemIntLit16 | AndIntLit16
            | OrIntLit16 | XorIntLit16 | AddIntLit8 | RsubIntLit8 | MulIntLit8 | DivIntLit8
            | RemIntLit8 | AndIntLit8 | OrIntLit8 | XorIntLit8 | ShlIntLit8 | ShrIntLit8
            | UshrIntLit8 => Format::TwoRegistersLiteral,

            ConstString | ConstStringJumbo | ConstClass | CheckCast | NewInstance
            | ConstMethodHandle | ConstMethodType => Format::RegisterReference,
            Sget | SgetWide | SgetObject | SgetBoolean | SgetByte | SgetChar | SgetShort | Sput
            | SputWide | SputObject | SputBoolean | SputByte | SputChar | SputShort => {
                Format::RegisterReference
            }
            InstanceOf | NewArray => Format::TwoRegistersReference,
            Iget | IgetWide | IgetObject | IgetBoolean | IgetByte | IgetChar | IgetShort | Iput
            | IputWide | IputObject | IputBoolean | IputByte | IputChar | IputShort => {
                Format::TwoRegistersReference
            }

            FilledNewArray | InvokeVirtual | InvokeSuper | InvokeDirect | InvokeStatic
            | InvokeInterface | InvokeCustom => Format::RegisterList,
            FilledNewArrayRange | InvokeVirtualRange | InvokeSuperRange | InvokeDirectRange
            | InvokeStaticRange | InvokeInterfaceRange | InvokeCustomRange => {
                Format::RegisterRange
            }
            InvokePolymorphic => Format::RegisterListPrototype,
            InvokePolymorphicRange => Format::RegisterRangePrototype,

            Goto | Goto16 | Goto32 => Format::Branch,
            PackedSwitch | SparseSwitch | IfEqz | IfNez | IfLtz | IfGez | IfGtz | IfLez => {
                Format::RegisterBranch
            }
            IfEq | IfNe | IfLt | IfGe | IfGt | IfLe => Format::TwoRegistersBranch,
            FillArrayData => Format::RegisterPayload,
        }
    }

    /// Kind of reference operand this opcode carries, if any
    pub fn reference_kind(&self) -> Option<ReferenceKind> {
        use Opcode::*;
        match self {
            ConstString | ConstStringJumbo => Some(ReferenceKind::String),
            ConstClass | CheckCast | InstanceOf | NewInstance | NewArray | FilledNewArray
            | FilledNewArrayRange => Some(ReferenceKind::Type),
            ConstMethodHandle => Some(ReferenceKind::MethodHandle),
            ConstMethodType => Some(ReferenceKind::MethodType),
            InvokeCustom | InvokeCustomRange => Some(ReferenceKind::CallSite),
            _ if self.is_field_access() => Some(ReferenceKind::Field),
            _ if self.is_invoke() => Some(ReferenceKind::Method),
            _ => None,
        }
    }

    pub fn is_invoke(&self) -> bool {
        matches!(
            self.format(),
            Format::RegisterList
                | Format::RegisterRange
                | Format::RegisterListPrototype
                | Format::RegisterRangePrototype
        ) && !matches!(self, Opcode::FilledNewArray | Opcode::FilledNewArrayRange)
    }

    /// `iget*`, `iput*`, `sget*` and `sput*`
    pub fn is_field_access(&self) -> bool {
        let op = *self as u8;
        (0x52..=0x6d).contains(&op)
    }

    /// Whether a following `move-result*` can pick up a value from this opcode
    pub fn sets_result(&self) -> bool {
        self.is_invoke() || matches!(self, Opcode::FilledNewArray | Opcode::FilledNewArrayRange)
    }

    /// Whether the prototype operand of `invoke-polymorphic` follows the reference
    pub fn has_prototype(&self) -> bool {
        matches!(
            self.format(),
            Format::RegisterListPrototype | Format::RegisterRangePrototype
        )
    }

    pub fn is_branch(&self) -> bool {
        matches!(
            self.format(),
            Format::Branch | Format::RegisterBranch | Format::TwoRegistersBranch
        )
    }

    pub fn is_return(&self) -> bool {
        matches!(
            self,
            Opcode::ReturnVoid | Opcode::Return | Opcode::ReturnWide | Opcode::ReturnObject
        )
    }

    pub fn is_move_result(&self) -> bool {
        matches!(
            self,
            Opcode::MoveResult | Opcode::MoveResultWide | Opcode::MoveResultObject
        )
    }

    /// Whether the literal operand is a 64-bit value
    pub fn is_wide_literal(&self) -> bool {
        matches!(
            self,
            Opcode::ConstWide16 | Opcode::ConstWide32 | Opcode::ConstWide | Opcode::ConstWideHigh16
        )
    }
}

impl Serialize for Opcode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mnemonic())
    }
}

impl<'de> Deserialize<'de> for Opcode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mnemonic = String::deserialize(deserializer)?;
        mnemonic
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown opcode '{}'", mnemonic)))
    }
}
