//! The class pool patches resolve against and mutate in place.
//!
//! Classes keep their declaration order, and methods keep theirs inside each
//! class. Resolution is first-match in that order, so iteration order is part
//! of the contract. Classes and methods are only ever appended, which keeps
//! [`ClassId`] and [`MethodId`] handles valid for the whole run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::class::ClassDef;
use super::method::Method;
use super::reference::MethodRef;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    pub class: ClassId,
    index: usize,
}

impl MethodId {
    /// Position of the method inside its class
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassPool {
    classes: Vec<ClassDef>,
    by_descriptor: HashMap<String, usize>,
}

/// On-disk form of a class pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolFile {
    pub classes: Vec<ClassDef>,
}

impl ClassPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool, keeping the first class for any repeated descriptor
    pub fn from_classes(classes: Vec<ClassDef>) -> Self {
        let mut pool = Self::new();
        for class in classes {
            if let Err(e) = pool.add_class(class) {
                warn!("Skipping class: {}", e);
            }
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + use<> {
        (0..self.classes.len()).map(ClassId)
    }

    pub fn find_class(&self, descriptor: &str) -> Option<ClassId> {
        self.by_descriptor.get(descriptor).copied().map(ClassId)
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.classes[id.class.0].methods[id.index]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.classes[id.class.0].methods[id.index]
    }

    /// Handle for the method at `index` in `class`
    pub fn method_id(&self, class: ClassId, index: usize) -> Option<MethodId> {
        (index < self.class(class).methods.len()).then_some(MethodId { class, index })
    }

    /// Methods of one class, in declaration order
    pub fn class_methods(&self, class: ClassId) -> impl Iterator<Item = MethodId> + use<> {
        (0..self.class(class).methods.len()).map(move |index| MethodId { class, index })
    }

    /// Every method of every class, in pool order
    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.class_ids().flat_map(|class| self.class_methods(class))
    }

    /// Find a method by its full reference
    pub fn find_method(&self, reference: &MethodRef) -> Option<MethodId> {
        let class = self.find_class(&reference.defining_class)?;
        let index = self.class(class).method_index(reference)?;
        Some(MethodId { class, index })
    }

    /// Find the first method with this name in a class
    pub fn find_method_by_name(&self, class: ClassId, name: &str) -> Option<MethodId> {
        let index = self.class(class).method_index_by_name(name)?;
        Some(MethodId { class, index })
    }

    pub fn add_class(&mut self, class: ClassDef) -> Result<ClassId> {
        if self.by_descriptor.contains_key(&class.descriptor) {
            return Err(Error::DuplicateClass(class.descriptor));
        }
        let id = self.classes.len();
        self.by_descriptor.insert(class.descriptor.clone(), id);
        self.classes.push(class);
        Ok(ClassId(id))
    }

    /// Attach a method to a class
    ///
    /// The method's defining class is set to the target class.
    pub fn add_method(&mut self, class: ClassId, mut method: Method) -> Result<MethodId> {
        let target = self.class_mut(class);
        method.defining_class = target.descriptor.clone();
        if target.method_index(&method.method_ref()).is_some() {
            return Err(Error::DuplicateMethod(method.descriptor()));
        }

        debug!("Adding method {}", method.descriptor());
        target.methods.push(method);
        Ok(MethodId {
            class,
            index: target.methods.len() - 1,
        })
    }
}

pub fn load_pool<P: AsRef<Path>>(path: P) -> Result<ClassPool> {
    let content = fs::read_to_string(&path)?;
    let file: PoolFile = serde_json::from_str(&content)?;
    Ok(ClassPool::from_classes(file.classes))
}

pub fn save_pool<P: AsRef<Path>>(path: P, pool: &ClassPool) -> Result<()> {
    let file = PoolFile {
        classes: pool.classes.clone(),
    };
    let content = serde_json::to_string_pretty(&file)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{AccessFlags, Instruction, Opcode};
    use tempfile::NamedTempFile;

    fn method(class: &str, name: &str) -> Method {
        Method::new(class, name, vec![], "V", AccessFlags::PUBLIC)
    }

    fn pool() -> ClassPool {
        ClassPool::from_classes(vec![
            ClassDef::new("La;").with_method(method("La;", "one")).with_method(method("La;", "two")),
            ClassDef::new("Lb;").with_method(method("Lb;", "three")),
        ])
    }

    #[test]
    fn test_methods_in_declaration_order() {
        let pool = pool();
        let names: Vec<&str> = pool
            .methods()
            .map(|id| pool.method(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_find_method() {
        let pool = pool();
        let id = pool.find_method(&"Lb;->three()V".parse().unwrap()).unwrap();
        assert_eq!(pool.method(id).name, "three");
        assert!(pool.find_method(&"Lb;->three(I)V".parse().unwrap()).is_none());
        assert!(pool.find_method(&"Lc;->three()V".parse().unwrap()).is_none());
    }

    #[test]
    fn test_duplicate_class_keeps_first() {
        let pool = ClassPool::from_classes(vec![
            ClassDef::new("La;").with_method(method("La;", "first")),
            ClassDef::new("La;").with_method(method("La;", "second")),
        ]);
        assert_eq!(pool.len(), 1);
        let class = pool.find_class("La;").unwrap();
        assert_eq!(pool.class(class).methods[0].name, "first");
    }

    #[test]
    fn test_add_method() {
        let mut pool = pool();
        let class = pool.find_class("Lb;").unwrap();
        let id = pool.add_method(class, method("Lelsewhere;", "four")).unwrap();
        assert_eq!(pool.method(id).defining_class, "Lb;");
        assert_eq!(id.index(), 1);

        let err = pool.add_method(class, method("Lb;", "four"));
        assert!(matches!(err, Err(Error::DuplicateMethod(_))));
    }

    #[test]
    fn test_load_disassembled_body() {
        let temp_file = NamedTempFile::new().unwrap();
        let json = r#"{"classes":[{"descriptor":"Lapp/Mixer;","methods":[{
            "defining_class":"Lapp/Mixer;",
            "name":"mix",
            "parameters":["[J","I"],
            "return_type":"J",
            "registers":6,
            "instructions":[
                {"opcode":"aget-wide","registers":[0,3,5]},
                {"opcode":"add-int/2addr","registers":[5,5]},
                {"opcode":"rem-int/lit16","registers":[5,5],"literal":1000},
                {"opcode":"move-object/from16","registers":[2,3]},
                {"opcode":"aput-wide","registers":[0,2,5]},
                {"opcode":"iget-char","registers":[1,4],"reference":{"field":"Lapp/Mixer;->c:C"}},
                {"opcode":"fill-array-data","registers":[2],"target":8},
                {"opcode":"return-wide","registers":[0]},
                {"opcode":"nop"}
            ]}]}]}"#;
        std::fs::write(temp_file.path(), json).unwrap();

        let pool = load_pool(temp_file.path()).unwrap();
        let id = pool
            .find_method(&"Lapp/Mixer;->mix([JI)J".parse().unwrap())
            .unwrap();
        let opcodes: Vec<Opcode> = pool.method(id).instructions.iter().map(|i| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::AgetWide,
                Opcode::AddInt2addr,
                Opcode::RemIntLit16,
                Opcode::MoveObjectFrom16,
                Opcode::AputWide,
                Opcode::IgetChar,
                Opcode::FillArrayData,
                Opcode::ReturnWide,
                Opcode::Nop,
            ]
        );
        assert_eq!(pool.method(id).instructions[2].literal, Some(1000));
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut pool = pool();
        let class = pool.find_class("La;").unwrap();
        let id = pool.find_method_by_name(class, "one").unwrap();
        pool.method_mut(id).instructions.push(Instruction::new(Opcode::ReturnVoid));

        save_pool(temp_file.path(), &pool).unwrap();
        let loaded = load_pool(temp_file.path()).unwrap();
        assert_eq!(loaded.classes(), pool.classes());
    }
}
